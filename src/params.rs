use crate::curve::CurvePoint;
use crate::traits::SerializableToArray;

/// An object containing shared scheme parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Parameters {
    /// The second generator, with an unknown discrete logarithm relative to `G`.
    pub(crate) u: CurvePoint,
}

impl Parameters {
    /// Creates a new parameter object.
    pub fn new() -> Self {
        // The goal is to find two distinct points `g` and `u` for which `log_g(u)` is unknown.
        // `g` is fixed to be the generator because it has to be the same
        // as the one used for secret/public keys, and it is standardized (for a given curve).
        let g = CurvePoint::generator();
        let g_bytes = g.to_array();

        let parameters_seed = b"PARAMETERS";
        // Only fails with a negligible probability, and with a fixed input
        // either always or never.
        let u = CurvePoint::from_data(parameters_seed, &g_bytes)
            .expect("hash-to-curve of the generator is well-defined");

        Self { u }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {

    use super::Parameters;
    use crate::curve::CurvePoint;

    #[test]
    fn test_parameters_are_fixed() {
        let params1 = Parameters::new();
        let params2 = Parameters::new();
        assert_eq!(params1, params2);
        assert_ne!(params1.u, CurvePoint::generator());
        assert_ne!(params1.u, CurvePoint::identity());
    }
}
