use super::laws::RateError;
use crate::core::models::particle::ParticleType;
use serde::Deserialize;

/// Which law drives electron/hole hops and long-range singlet transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportModel {
    #[default]
    MillerAbrahams,
    Marcus,
}

/// Attempt frequency `ν0` (1/s) and inverse localization length `α` (1/nm) of one carrier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HoppingParameters {
    pub attempt_frequency: f64,
    pub inverse_localization_length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RateParameters {
    #[serde(default)]
    pub transport_model: TransportModel,
    pub electron: HoppingParameters,
    pub hole: HoppingParameters,
    /// Dexter transfer uses the Miller-Abrahams form with these constants.
    pub triplet: HoppingParameters,
    pub singlet_attempt_frequency: f64,
    /// Förster radius `R0` (nm).
    pub forster_radius: f64,
    /// Seconds.
    pub singlet_lifetime: f64,
    /// Seconds.
    pub triplet_lifetime: f64,
    /// Energy gained when free carriers bind into an exciton (eV).
    pub exciton_binding_energy: f64,
    /// Energy needed to split a CT state into free carriers (eV).
    pub ct_binding_energy: f64,
}

impl RateParameters {
    /// Hopping constants for a single-site carrier that moves with the Miller-Abrahams law.
    pub fn hopping(&self, kind: ParticleType) -> Result<&HoppingParameters, RateError> {
        match kind {
            ParticleType::Electron => Ok(&self.electron),
            ParticleType::Hole => Ok(&self.hole),
            ParticleType::Triplet => Ok(&self.triplet),
            ParticleType::Singlet | ParticleType::ChargeTransfer => {
                Err(RateError::UnsupportedType(kind))
            }
        }
    }

    pub fn lifetime(&self, kind: ParticleType) -> Result<f64, RateError> {
        match kind {
            ParticleType::Singlet => Ok(self.singlet_lifetime),
            ParticleType::Triplet => Ok(self.triplet_lifetime),
            _ => Err(RateError::UndecayableType(kind)),
        }
    }

    /// Extra energy an exciton must pay to become a CT state.
    #[inline]
    pub fn ct_formation_penalty(&self) -> f64 {
        self.exciton_binding_energy - self.ct_binding_energy
    }

    pub fn validate(&self) -> Result<(), RateError> {
        let carriers = [
            ("electron", &self.electron),
            ("hole", &self.hole),
            ("triplet", &self.triplet),
        ];
        for (name, p) in carriers {
            if !p.attempt_frequency.is_finite() || p.attempt_frequency < 0.0 {
                return Err(RateError::InvalidParameter {
                    name,
                    value: p.attempt_frequency,
                });
            }
            if !p.inverse_localization_length.is_finite() || p.inverse_localization_length < 0.0 {
                return Err(RateError::InvalidParameter {
                    name,
                    value: p.inverse_localization_length,
                });
            }
        }

        let non_negative = [
            ("singlet-attempt-frequency", self.singlet_attempt_frequency),
            ("forster-radius", self.forster_radius),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(RateError::InvalidParameter { name, value });
            }
        }

        for lifetime in [self.singlet_lifetime, self.triplet_lifetime] {
            if !lifetime.is_finite() || lifetime <= 0.0 {
                return Err(RateError::NonPositiveLifetime(lifetime));
            }
        }

        let energies = [
            ("exciton-binding-energy", self.exciton_binding_energy),
            ("ct-binding-energy", self.ct_binding_energy),
        ];
        for (name, value) in energies {
            if !value.is_finite() {
                return Err(RateError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_parameters() -> RateParameters {
        RateParameters {
            transport_model: TransportModel::MillerAbrahams,
            electron: HoppingParameters {
                attempt_frequency: 1e12,
                inverse_localization_length: 2.0,
            },
            hole: HoppingParameters {
                attempt_frequency: 1e12,
                inverse_localization_length: 2.0,
            },
            triplet: HoppingParameters {
                attempt_frequency: 1e11,
                inverse_localization_length: 5.0,
            },
            singlet_attempt_frequency: 1e9,
            forster_radius: 2.0,
            singlet_lifetime: 1e-9,
            triplet_lifetime: 1e-6,
            exciton_binding_energy: 0.5,
            ct_binding_energy: 0.2,
        }
    }

    #[test]
    fn deserializes_kebab_case_table_with_default_model() {
        let text = r#"
            singlet-attempt-frequency = 1e9
            forster-radius = 2.0
            singlet-lifetime = 1e-9
            triplet-lifetime = 1e-6
            exciton-binding-energy = 0.5
            ct-binding-energy = 0.2

            [electron]
            attempt-frequency = 1e12
            inverse-localization-length = 2.0

            [hole]
            attempt-frequency = 1e12
            inverse-localization-length = 2.0

            [triplet]
            attempt-frequency = 1e11
            inverse-localization-length = 5.0
        "#;
        let params: RateParameters = toml::from_str(text).unwrap();
        assert_eq!(params, sample_parameters());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn deserializes_marcus_model_name() {
        #[derive(Deserialize)]
        struct Wrapper {
            model: TransportModel,
        }
        let wrapper: Wrapper = toml::from_str("model = \"marcus\"").unwrap();
        assert_eq!(wrapper.model, TransportModel::Marcus);
    }

    #[test]
    fn hopping_is_undefined_for_singlets_and_ct_states() {
        let params = sample_parameters();
        assert_eq!(params.hopping(ParticleType::Triplet).unwrap().attempt_frequency, 1e11);
        assert_eq!(
            params.hopping(ParticleType::Singlet),
            Err(RateError::UnsupportedType(ParticleType::Singlet))
        );
    }

    #[test]
    fn lifetime_is_only_defined_for_excitons() {
        let params = sample_parameters();
        assert_eq!(params.lifetime(ParticleType::Triplet), Ok(1e-6));
        assert_eq!(
            params.lifetime(ParticleType::Hole),
            Err(RateError::UndecayableType(ParticleType::Hole))
        );
    }

    #[test]
    fn validate_rejects_zero_lifetime_and_negative_frequency() {
        let mut params = sample_parameters();
        params.singlet_lifetime = 0.0;
        assert_eq!(params.validate(), Err(RateError::NonPositiveLifetime(0.0)));

        let mut params = sample_parameters();
        params.hole.attempt_frequency = -1.0;
        assert!(matches!(
            params.validate(),
            Err(RateError::InvalidParameter { name: "hole", .. })
        ));
    }
}
