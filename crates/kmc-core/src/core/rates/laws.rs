use crate::core::models::particle::ParticleType;
use std::f64::consts::PI;
use thiserror::Error;

/// Reduced Planck constant in eV·s.
pub const HBAR_EV_S: f64 = 6.582_119_569e-16;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RateError {
    #[error("Hopping distance must be finite and positive, got {0}")]
    NonPositiveDistance(f64),

    #[error("Reorganization energy must be finite and positive, got {0}")]
    NonPositiveReorganization(f64),

    #[error("Thermal energy kT must be finite and positive, got {0}")]
    NonPositiveThermalEnergy(f64),

    #[error("Squared coupling must be finite and non-negative, got {0}")]
    InvalidCoupling(f64),

    #[error("Lifetime must be finite and positive, got {0}")]
    NonPositiveLifetime(f64),

    #[error("Particle type {0} has no unimolecular decay channel")]
    UndecayableType(ParticleType),

    #[error("Particle type {0} has no rate law for this channel")]
    UnsupportedType(ParticleType),

    #[error("Rate parameter '{name}' is invalid: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Rate evaluated to a non-finite or negative value ({0})")]
    NonFinite(f64),
}

#[inline]
fn check_distance(distance: f64) -> Result<(), RateError> {
    if distance.is_finite() && distance > 0.0 {
        Ok(())
    } else {
        Err(RateError::NonPositiveDistance(distance))
    }
}

#[inline]
fn check_thermal_energy(kt: f64) -> Result<(), RateError> {
    if kt.is_finite() && kt > 0.0 {
        Ok(())
    } else {
        Err(RateError::NonPositiveThermalEnergy(kt))
    }
}

#[inline]
fn finite_rate(rate: f64) -> Result<f64, RateError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(rate)
    } else {
        Err(RateError::NonFinite(rate))
    }
}

/// Boltzmann penalty applied to uphill moves only.
#[inline]
fn uphill_factor(delta_e: f64, kt: f64) -> f64 {
    if delta_e <= 0.0 {
        1.0
    } else {
        (-delta_e / kt).exp()
    }
}

/// Miller-Abrahams hopping rate.
///
/// `delta_e` already contains the field term `q·E·dx`.
pub fn miller_abrahams(
    attempt_frequency: f64,
    inverse_localization_length: f64,
    distance: f64,
    delta_e: f64,
    kt: f64,
) -> Result<f64, RateError> {
    check_distance(distance)?;
    check_thermal_energy(kt)?;
    let tunnelling = (-2.0 * inverse_localization_length * distance).exp();
    finite_rate(attempt_frequency * tunnelling * uphill_factor(delta_e, kt))
}

/// Förster (dipole-dipole) energy transfer rate, `ν0·(R0/r)^6` with an uphill penalty.
pub fn forster(
    attempt_frequency: f64,
    forster_radius: f64,
    distance: f64,
    delta_e: f64,
    kt: f64,
) -> Result<f64, RateError> {
    check_distance(distance)?;
    check_thermal_energy(kt)?;
    let ratio = forster_radius / distance;
    finite_rate(attempt_frequency * ratio.powi(6) * uphill_factor(delta_e, kt))
}

/// Marcus (non-adiabatic) transfer rate from site i to site j.
///
/// `delta_e` is `E_j - E_i` in the channel of `kind`. Holes enter with `+delta_e`, electrons
/// and neutral excitations with `-delta_e`; `field_energy` is the `q·E·dx` term.
pub fn marcus(
    jeff2: f64,
    lambda: f64,
    delta_e: f64,
    field_energy: f64,
    kt: f64,
    kind: ParticleType,
) -> Result<f64, RateError> {
    if !jeff2.is_finite() || jeff2 < 0.0 {
        return Err(RateError::InvalidCoupling(jeff2));
    }
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(RateError::NonPositiveReorganization(lambda));
    }
    check_thermal_energy(kt)?;

    let total_energy = match kind {
        ParticleType::Hole => delta_e - lambda + field_energy,
        _ => -delta_e - lambda + field_energy,
    };
    let prefactor = 2.0 * PI / HBAR_EV_S * jeff2 / (4.0 * PI * lambda * kt).sqrt();
    finite_rate(prefactor * (-total_energy * total_energy / (4.0 * lambda * kt)).exp())
}

/// Unimolecular decay rate `1 / lifetime`.
pub fn decay(lifetime: f64) -> Result<f64, RateError> {
    if !lifetime.is_finite() || lifetime <= 0.0 {
        return Err(RateError::NonPositiveLifetime(lifetime));
    }
    finite_rate(1.0 / lifetime)
}
