use serde::{Deserialize, Serialize};

/// Upper bound of every factor value and of the weighted total
pub const MAX_FACTOR: f64 = 100.0;

/// The five weighted dimensions of a trust score, in their fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Identity,
    Provenance,
    Behavior,
    Reputation,
    Transparency,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::Identity,
        Factor::Provenance,
        Factor::Behavior,
        Factor::Reputation,
        Factor::Transparency,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Factor::Identity => "identity",
            Factor::Provenance => "provenance",
            Factor::Behavior => "behavior",
            Factor::Reputation => "reputation",
            Factor::Transparency => "transparency",
        }
    }

    pub fn weight(&self) -> f64 {
        WEIGHTS.get(*self)
    }
}

/// One value per factor. Used both for factor scores (0-100) and for weights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorSet {
    pub identity: f64,
    pub provenance: f64,
    pub behavior: f64,
    pub reputation: f64,
    pub transparency: f64,
}

/// Factor weights. Must sum to 1.0.
pub const WEIGHTS: FactorSet = FactorSet {
    identity: 0.25,
    provenance: 0.25,
    behavior: 0.20,
    reputation: 0.15,
    transparency: 0.15,
};

impl FactorSet {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Identity => self.identity,
            Factor::Provenance => self.provenance,
            Factor::Behavior => self.behavior,
            Factor::Reputation => self.reputation,
            Factor::Transparency => self.transparency,
        }
    }

    fn slot(&mut self, factor: Factor) -> &mut f64 {
        match factor {
            Factor::Identity => &mut self.identity,
            Factor::Provenance => &mut self.provenance,
            Factor::Behavior => &mut self.behavior,
            Factor::Reputation => &mut self.reputation,
            Factor::Transparency => &mut self.transparency,
        }
    }

    /// Set a factor, clamped to [0, 100]
    pub fn set(&mut self, factor: Factor, value: f64) {
        *self.slot(factor) = clamp_factor(value);
    }

    /// Add a bonus to a factor, clamped to the 100 ceiling
    pub fn add(&mut self, factor: Factor, bonus: f64) {
        let slot = self.slot(factor);
        *slot = clamp_factor(*slot + bonus);
    }

    /// Weighted sum over the fixed factor set
    pub fn weighted_total(&self) -> f64 {
        Factor::ALL
            .iter()
            .map(|f| self.get(*f) * f.weight())
            .sum()
    }
}

pub fn clamp_factor(value: f64) -> f64 {
    value.clamp(0.0, MAX_FACTOR)
}

/// Letter grade of a total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Thresholds are exclusive lower bounds: 90 is an "A", 90.01 an "A+"
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s > 90.0 => Grade::APlus,
            s if s > 80.0 => Grade::A,
            s if s > 65.0 => Grade::B,
            s if s > 50.0 => Grade::C,
            s if s > 35.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let sum: f64 = Factor::ALL.iter().map(|f| f.weight()).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_grade_boundaries_are_exclusive() {
        assert_eq!(Grade::from_score(91.0), Grade::APlus);
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(85.0), Grade::A);
        assert_eq!(Grade::from_score(80.0), Grade::B);
        assert_eq!(Grade::from_score(65.0), Grade::C);
        assert_eq!(Grade::from_score(50.0), Grade::D);
        assert_eq!(Grade::from_score(35.0), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
    }

    #[test]
    fn test_grade_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
        assert_eq!(Grade::C.to_string(), "C");
    }

    #[test]
    fn test_add_clamps_at_ceiling() {
        let mut set = FactorSet { identity: 95.0, ..Default::default() };
        set.add(Factor::Identity, 20.0);
        assert_eq!(set.identity, 100.0);

        set.set(Factor::Behavior, -4.0);
        assert_eq!(set.behavior, 0.0);
    }

    #[test]
    fn test_weighted_total() {
        let set = FactorSet {
            identity: 100.0,
            provenance: 100.0,
            behavior: 50.0,
            reputation: 0.0,
            transparency: 40.0,
        };
        // 25 + 25 + 10 + 0 + 6
        assert!((set.weighted_total() - 66.0).abs() < 1e-9);
    }
}
