pub mod core {
    pub mod behavior;
    pub mod color;
    pub mod handle_race;
    pub mod music_cue;
    pub mod race;
    pub mod rat;
    pub mod sprite_cache;
    pub mod state_handler;
    pub mod track;
}
pub mod interfaces {
    pub mod render_interface;
}
pub mod post {
    pub mod race_result;
}
pub mod pre {
    pub mod read_sim_pars;
    pub mod sim_opts;
    pub mod sprite_meta;
}
