//! Standard normal quantile function (Wichura's AS241, double precision).

/// Inverse CDF of N(0, 1). `p` must lie strictly inside `(0, 1)`;
/// the endpoints map to the infinities.
pub fn inv_cdf(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let q = p - 0.5;
    if q.abs() <= 0.425 {
        let r = 0.180625 - q * q;
        let num = (((((((2509.0809287301226727 * r + 33430.575583588128105) * r
            + 67265.770927008700853)
            * r
            + 45921.953931549871457)
            * r
            + 13731.693765509461125)
            * r
            + 1971.5909503065514427)
            * r
            + 133.14166789178437745)
            * r
            + 3.387132872796366608)
            * q;
        let den = ((((((5226.495278852545610 * r + 28729.085735721942674) * r
            + 39307.895800092710610)
            * r
            + 21213.794301586595867)
            * r
            + 5394.1960214247511077)
            * r
            + 687.18700749205790830)
            * r
            + 42.313330701600911252)
            * r
            + 1.0;
        return num / den;
    }

    let r = if q <= 0.0 { p } else { 1.0 - p };
    let mut r = (-r.ln()).sqrt();
    let x = if r <= 5.0 {
        r -= 1.6;
        let num = ((((((7.74545014278341407640e-4 * r + 2.27238449892691845833e-2) * r
            + 2.41780725177450611770e-1)
            * r
            + 1.27045825245236838258)
            * r
            + 3.64784832476320460504)
            * r
            + 5.76949722146069140550)
            * r
            + 4.63033784615654529590)
            * r
            + 1.42343711074968357734;
        let den = ((((((1.05075007164441684324e-9 * r + 5.47593808499534494600e-4) * r
            + 1.51986665636164571966e-2)
            * r
            + 1.48103976427480074590e-1)
            * r
            + 6.89767334985100004550e-1)
            * r
            + 1.67638483018380384940)
            * r
            + 2.05319162663775882187)
            * r
            + 1.0;
        num / den
    } else {
        r -= 5.0;
        let num = ((((((2.01033439929228813265e-7 * r + 2.71155556874348757815e-5) * r
            + 1.24266094738807843860e-3)
            * r
            + 2.65321895265761230930e-2)
            * r
            + 2.96560571828504891230e-1)
            * r
            + 1.78482653991729133580)
            * r
            + 5.46378491116411436990)
            * r
            + 6.65790464350110377720;
        let den = ((((((2.04426310338993978564e-15 * r + 1.42151175831644588870e-7) * r
            + 1.84631831751005468180e-5)
            * r
            + 7.86869131145613259100e-4)
            * r
            + 1.48753612908506148525e-2)
            * r
            + 1.36929880922735805310e-1)
            * r
            + 5.99832206555887937690e-1)
            * r
            + 1.0;
        num / den
    };

    if q < 0.0 {
        -x
    } else {
        x
    }
}

/// `alphabet_size - 1` equiprobable cut points of N(0, 1), ascending.
pub fn gaussian_breakpoints(alphabet_size: usize) -> Vec<f64> {
    (1..alphabet_size)
        .map(|i| inv_cdf(i as f64 / alphabet_size as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_quantiles() {
        assert_eq!(inv_cdf(0.5), 0.0);
        assert!((inv_cdf(0.975) - 1.959963984540054).abs() < 1e-12);
        assert!((inv_cdf(0.025) + 1.959963984540054).abs() < 1e-12);
        assert!((inv_cdf(0.75) - 0.6744897501960817).abs() < 1e-12);
        assert!((inv_cdf(1e-10) + 6.361340902404056).abs() < 1e-9);
    }

    #[test]
    fn test_breakpoints_are_symmetric() {
        let bp = gaussian_breakpoints(4);
        assert_eq!(bp.len(), 3);
        assert!((bp[0] + bp[2]).abs() < 1e-12);
        assert_eq!(bp[1], 0.0);
        assert!(gaussian_breakpoints(1).is_empty());
    }
}
