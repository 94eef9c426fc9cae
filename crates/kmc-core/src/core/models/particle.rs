use super::ids::SiteId;
use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;

/// Draws below this value turn a recombining electron-hole pair into a triplet (spin
/// statistics: three triplet states for every singlet).
pub const TRIPLET_FORMATION_THRESHOLD: f64 = 0.75;

/// The closed set of particle kinds living on the lattice.
///
/// The discriminant doubles as the occupancy-channel index of a [`super::site::Site`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParticleType {
    Electron = 0,
    Hole = 1,
    Triplet = 2,
    Singlet = 3,
    /// A bound electron-hole pair on two neighbouring sites.
    ChargeTransfer = 4,
}

impl ParticleType {
    pub const ALL: [ParticleType; 5] = [
        ParticleType::Electron,
        ParticleType::Hole,
        ParticleType::Triplet,
        ParticleType::Singlet,
        ParticleType::ChargeTransfer,
    ];

    #[inline]
    pub const fn channel(self) -> usize {
        self as usize
    }

    /// Elementary charge in units of `e`.
    #[inline]
    pub const fn charge(self) -> f64 {
        match self {
            ParticleType::Electron => -1.0,
            ParticleType::Hole => 1.0,
            ParticleType::Triplet | ParticleType::Singlet | ParticleType::ChargeTransfer => 0.0,
        }
    }

    /// The opposite free carrier, if this is one.
    #[inline]
    pub const fn complement(self) -> Option<ParticleType> {
        match self {
            ParticleType::Electron => Some(ParticleType::Hole),
            ParticleType::Hole => Some(ParticleType::Electron),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_exciton(self) -> bool {
        matches!(self, ParticleType::Singlet | ParticleType::Triplet)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ParticleType::Electron => "electron",
            ParticleType::Hole => "hole",
            ParticleType::Triplet => "triplet",
            ParticleType::Singlet => "singlet",
            ParticleType::ChargeTransfer => "ct",
        }
    }
}

impl fmt::Display for ParticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "electron" | "elec" | "e" => Ok(ParticleType::Electron),
            "hole" | "h" => Ok(ParticleType::Hole),
            "triplet" | "trip" | "t" => Ok(ParticleType::Triplet),
            "singlet" | "sing" | "s" => Ok(ParticleType::Singlet),
            "ct" | "charge-transfer" => Ok(ParticleType::ChargeTransfer),
            other => Err(format!("Unknown particle type '{}'", other)),
        }
    }
}

/// A mobile entity on the lattice.
///
/// For a [`ParticleType::ChargeTransfer`] particle `site` holds the hole and `partner_site`
/// holds the electron. For every other type `partner_site` is `None`.
///
/// None of the methods touch site occupancy; callers keep the two in sync.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    kind: ParticleType,
    site: SiteId,
    partner_site: Option<SiteId>,
    displacement: Vector3<f64>,
    alive: bool,
    serial: usize,
    created_at: f64,
    died_at: Option<f64>,
}

impl Particle {
    pub fn new(kind: ParticleType, site: SiteId, created_at: f64) -> Self {
        Self {
            kind,
            site,
            partner_site: None,
            displacement: Vector3::zeros(),
            alive: true,
            serial: 0,
            created_at,
            died_at: None,
        }
    }

    pub(crate) fn with_serial(mut self, serial: usize) -> Self {
        self.serial = serial;
        self
    }

    /// Creation index within the owning arena; never reused.
    #[inline]
    pub fn serial(&self) -> usize {
        self.serial
    }

    #[inline]
    pub fn kind(&self) -> ParticleType {
        self.kind
    }

    #[inline]
    pub fn site(&self) -> SiteId {
        self.site
    }

    #[inline]
    pub fn partner_site(&self) -> Option<SiteId> {
        self.partner_site
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[inline]
    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    #[inline]
    pub fn died_at(&self) -> Option<f64> {
        self.died_at
    }

    #[inline]
    pub fn displacement(&self) -> &Vector3<f64> {
        &self.displacement
    }

    pub fn distance_travelled(&self) -> f64 {
        self.displacement.norm()
    }

    /// Site of the electron carried by this particle (free electron or CT state).
    pub fn electron_site(&self) -> Option<SiteId> {
        match self.kind {
            ParticleType::Electron => Some(self.site),
            ParticleType::ChargeTransfer => self.partner_site,
            _ => None,
        }
    }

    /// Site of the hole carried by this particle (free hole or CT state).
    pub fn hole_site(&self) -> Option<SiteId> {
        match self.kind {
            ParticleType::Hole | ParticleType::ChargeTransfer => Some(self.site),
            _ => None,
        }
    }

    /// Moves the particle and accumulates the displacement of the jump.
    pub fn jump_to(&mut self, new_site: SiteId, displacement: Vector3<f64>) {
        self.site = new_site;
        self.displacement += displacement;
    }

    /// Turns the particle into an exciton in place; `uniform01` decides the spin state.
    pub fn make_exciton(&mut self, uniform01: f64) -> ParticleType {
        self.kind = if uniform01 < TRIPLET_FORMATION_THRESHOLD {
            ParticleType::Triplet
        } else {
            ParticleType::Singlet
        };
        self.partner_site = None;
        self.kind
    }

    pub fn make_ct_state(&mut self, hole_site: SiteId, electron_site: SiteId) {
        self.kind = ParticleType::ChargeTransfer;
        self.site = hole_site;
        self.partner_site = Some(electron_site);
    }

    pub fn make_electron(&mut self, site: SiteId) {
        self.kind = ParticleType::Electron;
        self.site = site;
        self.partner_site = None;
    }

    pub fn make_hole(&mut self, site: SiteId) {
        self.kind = ParticleType::Hole;
        self.site = site;
        self.partner_site = None;
    }

    pub fn kill(&mut self, time: f64) {
        self.alive = false;
        self.died_at = Some(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_follow_declaration_order() {
        let channels: Vec<usize> = ParticleType::ALL.iter().map(|t| t.channel()).collect();
        assert_eq!(channels, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn complement_pairs_free_carriers_only() {
        assert_eq!(ParticleType::Electron.complement(), Some(ParticleType::Hole));
        assert_eq!(ParticleType::Hole.complement(), Some(ParticleType::Electron));
        assert_eq!(ParticleType::Singlet.complement(), None);
        assert_eq!(ParticleType::ChargeTransfer.complement(), None);
    }

    #[test]
    fn particle_type_parses_common_aliases() {
        assert_eq!("elec".parse::<ParticleType>(), Ok(ParticleType::Electron));
        assert_eq!("CT".parse::<ParticleType>(), Ok(ParticleType::ChargeTransfer));
        assert!("photon".parse::<ParticleType>().is_err());
    }

    #[test]
    fn jump_to_accumulates_displacement() {
        let mut p = Particle::new(ParticleType::Electron, 0, 0.0);
        p.jump_to(3, Vector3::new(1.0, 0.0, 0.0));
        p.jump_to(7, Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(p.site(), 7);
        assert_eq!(*p.displacement(), Vector3::new(1.0, 2.0, 0.0));
        assert!((p.distance_travelled() - 5.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn make_exciton_uses_single_threshold_comparison() {
        let mut p = Particle::new(ParticleType::Hole, 0, 0.0);
        assert_eq!(p.make_exciton(0.0), ParticleType::Triplet);
        assert_eq!(p.make_exciton(0.7499), ParticleType::Triplet);
        assert_eq!(p.make_exciton(0.75), ParticleType::Singlet);
        assert_eq!(p.make_exciton(0.99), ParticleType::Singlet);
        assert_eq!(p.kind(), ParticleType::Singlet);
    }

    #[test]
    fn make_ct_state_records_both_sites() {
        let mut p = Particle::new(ParticleType::Singlet, 4, 0.0);
        p.make_ct_state(4, 9);
        assert_eq!(p.kind(), ParticleType::ChargeTransfer);
        assert_eq!(p.hole_site(), Some(4));
        assert_eq!(p.electron_site(), Some(9));
    }

    #[test]
    fn make_electron_and_hole_clear_the_partner_site() {
        let mut p = Particle::new(ParticleType::Singlet, 4, 0.0);
        p.make_ct_state(4, 9);
        p.make_electron(11);
        assert_eq!(p.kind(), ParticleType::Electron);
        assert_eq!(p.partner_site(), None);
        assert_eq!(p.electron_site(), Some(11));

        p.make_ct_state(11, 2);
        p.make_hole(5);
        assert_eq!(p.hole_site(), Some(5));
        assert_eq!(p.electron_site(), None);
    }

    #[test]
    fn kill_records_death_time() {
        let mut p = Particle::new(ParticleType::Singlet, 0, 1.0);
        assert!(p.is_alive());
        p.kill(2.5);
        assert!(!p.is_alive());
        assert_eq!(p.died_at(), Some(2.5));
        assert_eq!(p.created_at(), 1.0);
    }
}
