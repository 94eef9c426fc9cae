use super::laws::{self, RateError};
use super::params::{RateParameters, TransportModel};
use crate::core::models::particle::ParticleType;
use crate::core::models::site::SiteEnergies;
use crate::core::models::topology::Topology;
use nalgebra::Vector3;

/// Evaluates rate laws for a directed site pair under fixed physical conditions.
///
/// Every method takes the energies of the source and target site plus the minimum-image
/// displacement `dr` (target minus source). Only `dr.x` enters the field term, since the
/// field points along x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateEngine {
    params: RateParameters,
    thermal_energy: f64,
    electric_field: f64,
}

impl RateEngine {
    pub fn new(
        params: RateParameters,
        thermal_energy: f64,
        electric_field: f64,
    ) -> Result<Self, RateError> {
        params.validate()?;
        if !thermal_energy.is_finite() || thermal_energy <= 0.0 {
            return Err(RateError::NonPositiveThermalEnergy(thermal_energy));
        }
        if !electric_field.is_finite() {
            return Err(RateError::InvalidParameter {
                name: "electric-field",
                value: electric_field,
            });
        }
        Ok(Self {
            params,
            thermal_energy,
            electric_field,
        })
    }

    /// Takes kT and the field from the topology.
    pub fn for_topology(params: RateParameters, topology: &Topology) -> Result<Self, RateError> {
        Self::new(params, topology.thermal_energy(), topology.electric_field())
    }

    #[inline]
    pub fn params(&self) -> &RateParameters {
        &self.params
    }

    #[inline]
    pub fn transport_model(&self) -> TransportModel {
        self.params.transport_model
    }

    #[inline]
    pub fn thermal_energy(&self) -> f64 {
        self.thermal_energy
    }

    /// `q·E·dx` for a particle of `kind` displaced by `dx` along the field.
    #[inline]
    pub fn field_energy(&self, kind: ParticleType, dx: f64) -> f64 {
        kind.charge() * self.electric_field * dx
    }

    fn channel_delta(
        from: &SiteEnergies,
        to: &SiteEnergies,
        kind: ParticleType,
    ) -> Result<f64, RateError> {
        match (from.for_type(kind), to.for_type(kind)) {
            (Some(a), Some(b)) => Ok(b - a),
            _ => Err(RateError::UnsupportedType(kind)),
        }
    }

    fn require_carrier(kind: ParticleType) -> Result<(), RateError> {
        match kind {
            ParticleType::Electron | ParticleType::Hole => Ok(()),
            _ => Err(RateError::UnsupportedType(kind)),
        }
    }

    /// Miller-Abrahams law with an extra energy `offset` added to the field-corrected ΔE.
    fn miller_abrahams_with_offset(
        &self,
        from: &SiteEnergies,
        to: &SiteEnergies,
        dr: &Vector3<f64>,
        kind: ParticleType,
        offset: f64,
    ) -> Result<f64, RateError> {
        let hopping = self.params.hopping(kind)?;
        let delta_e = Self::channel_delta(from, to, kind)? + self.field_energy(kind, dr.x) + offset;
        laws::miller_abrahams(
            hopping.attempt_frequency,
            hopping.inverse_localization_length,
            dr.norm(),
            delta_e,
            self.thermal_energy,
        )
    }

    /// Plain hop of an electron, hole, or (Dexter transfer) triplet.
    pub fn hop(
        &self,
        from: &SiteEnergies,
        to: &SiteEnergies,
        dr: &Vector3<f64>,
        kind: ParticleType,
    ) -> Result<f64, RateError> {
        self.miller_abrahams_with_offset(from, to, dr, kind, 0.0)
    }

    /// A free carrier jumping onto its opposite partner; the exciton binding energy is gained.
    pub fn exciton_generation(
        &self,
        from: &SiteEnergies,
        to: &SiteEnergies,
        dr: &Vector3<f64>,
        carrier: ParticleType,
    ) -> Result<f64, RateError> {
        Self::require_carrier(carrier)?;
        let offset = -self.params.exciton_binding_energy;
        self.miller_abrahams_with_offset(from, to, dr, carrier, offset)
    }

    /// An exciton splitting into a CT state by moving `carrier` to the neighbour.
    pub fn ct_formation(
        &self,
        from: &SiteEnergies,
        to: &SiteEnergies,
        dr: &Vector3<f64>,
        carrier: ParticleType,
    ) -> Result<f64, RateError> {
        Self::require_carrier(carrier)?;
        let offset = self.params.ct_formation_penalty();
        self.miller_abrahams_with_offset(from, to, dr, carrier, offset)
    }

    /// A CT state separating into free carriers by moving `carrier` away from its partner.
    pub fn ct_dissociation(
        &self,
        from: &SiteEnergies,
        to: &SiteEnergies,
        dr: &Vector3<f64>,
        carrier: ParticleType,
    ) -> Result<f64, RateError> {
        Self::require_carrier(carrier)?;
        let offset = self.params.ct_binding_energy;
        self.miller_abrahams_with_offset(from, to, dr, carrier, offset)
    }

    pub fn forster(
        &self,
        from: &SiteEnergies,
        to: &SiteEnergies,
        dr: &Vector3<f64>,
    ) -> Result<f64, RateError> {
        laws::forster(
            self.params.singlet_attempt_frequency,
            self.params.forster_radius,
            dr.norm(),
            to.singlet - from.singlet,
            self.thermal_energy,
        )
    }

    pub fn decay(&self, kind: ParticleType) -> Result<f64, RateError> {
        laws::decay(self.params.lifetime(kind)?)
    }

    /// Marcus rate for a transfer with squared coupling `jeff2`, reorganization `lambda`,
    /// channel offset `delta_e = E_to - E_from` and displacement `dx` along the field.
    pub fn marcus(
        &self,
        jeff2: f64,
        lambda: f64,
        delta_e: f64,
        dx: f64,
        kind: ParticleType,
    ) -> Result<f64, RateError> {
        laws::marcus(
            jeff2,
            lambda,
            delta_e,
            self.field_energy(kind, dx),
            self.thermal_energy,
            kind,
        )
    }
}
