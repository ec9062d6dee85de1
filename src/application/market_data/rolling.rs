//! Column operations over daily series with missing values.
//!
//! A [`Series`] holds one optional value per bar. `None` marks a value that
//! is not defined yet (window warm-up) or not computable (division by zero,
//! missing index close). Every operation here is trailing: row `i` only
//! looks at rows `..=i`.

pub type Series = Vec<Option<f64>>;

/// `Some(x)` for finite values, `None` for NaN and ±inf.
pub fn finite(x: f64) -> Option<f64> {
    if x.is_finite() { Some(x) } else { None }
}

/// Lifts a fully-populated column into a [`Series`].
pub fn present(values: &[f64]) -> Series {
    values.iter().map(|v| finite(*v)).collect()
}

/// Sign with `sign(0) = 0`.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Applies `f` to every complete trailing window of `window` values.
/// A window containing any missing value yields `None`.
pub fn rolling<F>(series: &[Option<f64>], window: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; series.len()];
    if window == 0 {
        return out;
    }

    let mut buf = Vec::with_capacity(window);
    for i in (window - 1)..series.len() {
        buf.clear();
        buf.extend(series[i + 1 - window..=i].iter().map_while(|v| *v));
        if buf.len() == window {
            out[i] = f(&buf).and_then(finite);
        }
    }
    out
}

/// Paired version of [`rolling`]; a window is complete only when both
/// series are populated on every row of it.
pub fn rolling_pair<F>(a: &[Option<f64>], b: &[Option<f64>], window: usize, f: F) -> Series
where
    F: Fn(&[f64], &[f64]) -> Option<f64>,
{
    let len = a.len().min(b.len());
    let mut out = vec![None; len];
    if window == 0 {
        return out;
    }

    let mut xs = Vec::with_capacity(window);
    let mut ys = Vec::with_capacity(window);
    for i in (window - 1)..len {
        xs.clear();
        ys.clear();
        for j in i + 1 - window..=i {
            if let (Some(x), Some(y)) = (a[j], b[j]) {
                xs.push(x);
                ys.push(y);
            }
        }
        if xs.len() == window {
            out[i] = f(&xs, &ys).and_then(finite);
        }
    }
    out
}

/// `x[i] - x[i - periods]`.
pub fn diff(series: &[Option<f64>], periods: usize) -> Series {
    lagged(series, periods, |cur, prev| Some(cur - prev))
}

/// `x[i] / x[i - periods] - 1`.
pub fn pct_change(series: &[Option<f64>], periods: usize) -> Series {
    lagged(series, periods, |cur, prev| finite(cur / prev - 1.0))
}

/// Carries the last present value over later gaps. Leading gaps stay missing.
pub fn forward_fill(series: &[Option<f64>]) -> Series {
    let mut last = None;
    series
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

/// `x[i - periods]`, `None` for the first `periods` rows.
pub fn shift(series: &[Option<f64>], periods: usize) -> Series {
    (0..series.len())
        .map(|i| if i >= periods { series[i - periods] } else { None })
        .collect()
}

fn lagged<F>(series: &[Option<f64>], periods: usize, f: F) -> Series
where
    F: Fn(f64, f64) -> Option<f64>,
{
    (0..series.len())
        .map(|i| {
            if i < periods {
                return None;
            }
            match (series[i], series[i - periods]) {
                (Some(cur), Some(prev)) => f(cur, prev).and_then(finite),
                _ => None,
            }
        })
        .collect()
}

/// Running sum that skips missing values: a missing input yields a missing
/// output but does not reset the accumulator.
pub fn cumulative_sum(series: &[Option<f64>]) -> Series {
    let mut acc = 0.0;
    series
        .iter()
        .map(|v| {
            v.map(|x| {
                acc += x;
                acc
            })
        })
        .collect()
}

/// Element-wise combination; missing if either side is missing.
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Series
where
    F: Fn(f64, f64) -> f64,
{
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => finite(f(*x, *y)),
            _ => None,
        })
        .collect()
}

/// Element-wise map; missing stays missing.
pub fn map<F>(series: &[Option<f64>], f: F) -> Series
where
    F: Fn(f64) -> f64,
{
    series.iter().map(|v| v.and_then(|x| finite(f(x)))).collect()
}
