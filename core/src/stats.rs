use ordered_float::OrderedFloat;

use crate::types::{Correlation, UndefinedReason};

/// Aritmetisk snitt. `None` for tom serie.
pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().copied().sum::<f64>() / xs.len() as f64)
}

/// Snitt av de definerte verdiene (hopper over `None`).
pub fn mean_defined<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let xs: Vec<f64> = values.into_iter().flatten().collect();
    mean(&xs)
}

/// Populasjonsvarians (deler på n, ikke n-1).
pub fn population_variance(xs: &[f64]) -> Option<f64> {
    let m = mean(xs)?;
    let ss = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    Some(ss / xs.len() as f64)
}

/// Median av endelige verdier; snitt av midtparet ved partall.
pub fn median(xs: &[f64]) -> Option<f64> {
    let mut v: Vec<OrderedFloat<f64>> = xs
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .map(OrderedFloat)
        .collect();
    if v.is_empty() {
        return None;
    }
    v.sort();
    let n = v.len();
    if n % 2 == 1 {
        Some(v[n / 2].into_inner())
    } else {
        Some((v[n / 2 - 1].into_inner() + v[n / 2].into_inner()) / 2.0)
    }
}

/// Pearson r. Udefinert ved < 2 punkter eller null varians i en av seriene.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Correlation {
    if xs.len() != ys.len() {
        return Correlation::Undefined {
            reason: UndefinedReason::LengthMismatch,
        };
    }
    if xs.len() < 2 {
        return Correlation::Undefined {
            reason: UndefinedReason::TooFewPoints,
        };
    }
    if is_constant(xs) || is_constant(ys) {
        return Correlation::Undefined {
            reason: UndefinedReason::ZeroVariance,
        };
    }

    let (Some(mx), Some(my)) = (mean(xs), mean(ys)) else {
        return Correlation::Undefined {
            reason: UndefinedReason::TooFewPoints,
        };
    };

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return Correlation::Undefined {
            reason: UndefinedReason::ZeroVariance,
        };
    }

    let r = sxy / (sxx.sqrt() * syy.sqrt());
    Correlation::Defined {
        r: r.clamp(-1.0, 1.0),
    }
}

fn is_constant(xs: &[f64]) -> bool {
    xs.first().map_or(true, |first| xs.iter().all(|x| x == first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_even_and_nan() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN, 5.0]), Some(5.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn population_variance_divides_by_n() {
        let v = population_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((v - 4.0).abs() < 1e-12);
        assert_eq!(population_variance(&[]), None);
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        let r = pearson(&xs, &ys).value().unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let zs = [8.0, 6.0, 4.0, 2.0];
        let r = pearson(&xs, &zs).value().unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_undefined_cases() {
        assert_eq!(
            pearson(&[1.0], &[2.0]),
            Correlation::Undefined {
                reason: UndefinedReason::TooFewPoints
            }
        );
        assert_eq!(
            pearson(&[1.0, 2.0], &[2.0]),
            Correlation::Undefined {
                reason: UndefinedReason::LengthMismatch
            }
        );
        assert_eq!(
            pearson(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]),
            Correlation::Undefined {
                reason: UndefinedReason::ZeroVariance
            }
        );
    }
}
