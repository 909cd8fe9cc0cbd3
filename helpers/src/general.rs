use rand::Rng;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt;

/// InputValueError is used if some simulation option or parameter does not fulfill the posed
/// requirements, e.g., a corner radius that does not fit into the track.
#[derive(Debug, Clone)]
pub struct InputValueError {
    pub reason: String,
}

impl InputValueError {
    pub fn new(reason: impl Into<String>) -> InputValueError {
        InputValueError {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InputValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid input value: {}", self.reason)
    }
}

impl Error for InputValueError {}

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. NaN values compare as equal.
pub fn argsort<T: PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => {
            indices.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(Ordering::Equal))
        }
        SortOrder::Descending => {
            indices.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap_or(Ordering::Equal))
        }
    }
    indices
}

/// lin_interp returns the linearly interpolated value at x for given discrete data points xp, fp.
/// xp must be increasing. Values outside of xp are clamped to the first/last value of fp.
/// Inspired by numpy.interp.
pub fn lin_interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    assert_eq!(
        xp.len(),
        fp.len(),
        "Number of items in xp and fp must be equal!"
    );

    match fp.len() {
        0 => return 0.0,
        1 => return fp[0],
        _ => {}
    }

    if x <= xp[0] {
        return fp[0];
    }

    for i in 1..xp.len() {
        if x <= xp[i] {
            return fp[i - 1] + (x - xp[i - 1]) * (fp[i] - fp[i - 1]) / (xp[i] - xp[i - 1]);
        }
    }

    fp[fp.len() - 1]
}

/// wrap_unit maps any real value onto [0.0, 1.0[, negative values included.
pub fn wrap_unit(x: f64) -> f64 {
    ((x % 1.0) + 1.0) % 1.0
}

/// rand_in_range draws a uniformly distributed value from [range[0], range[1][. A degenerate
/// range returns its lower bound.
pub fn rand_in_range<R: Rng + ?Sized>(rng: &mut R, range: [f64; 2]) -> f64 {
    range[0] + rng.gen::<f64>() * (range[1] - range[0])
}
