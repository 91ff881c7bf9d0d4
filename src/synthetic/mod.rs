//! Synthetic passenger generation
//!
//! Produces a Titanic-like labeled corpus with realistic marginals
//! (class mix, sex ratio, age and fare distributions, sparse cabins) and a
//! survival pattern driven by sex, class and childhood. Generation is fully
//! determined by the seed.

use crate::dataset::{PassengerDataset, RawRecord};
use crate::error::Result;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const SURNAMES: &[&str] = &[
    "Allen", "Andersson", "Baxter", "Brown", "Carter", "Davies", "Dean", "Fortune",
    "Goodwin", "Harris", "Hocking", "Johnson", "Kelly", "Lefebre", "Moran", "Nasser",
    "Palsson", "Rice", "Sage", "Skoog", "Smith", "Taylor", "Ward", "Williams",
];

const MALE_GIVEN: &[&str] = &[
    "Owen", "William", "James", "Thomas", "John", "Charles", "Henry", "Ernst", "Karl", "Patrick",
];

const FEMALE_GIVEN: &[&str] = &[
    "Laina", "Florence", "Elisabeth", "Anna", "Margaret", "Mary", "Helen", "Alice", "Bertha", "Nora",
];

const DECKS: &[char] = &['A', 'B', 'C', 'D', 'E', 'F', 'G'];

/// Configuration for the synthetic generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Number of passengers to generate
    pub n_samples: usize,
    /// Random seed
    pub seed: u64,
    /// Probability that Age is left absent
    pub missing_age_rate: f64,
    /// Probability that Embarked is left absent
    pub missing_embarked_rate: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            n_samples: 891,
            seed: 42,
            missing_age_rate: 0.2,
            missing_embarked_rate: 0.003,
        }
    }
}

impl SyntheticConfig {
    pub fn with_n_samples(mut self, n: usize) -> Self {
        self.n_samples = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Generate a labeled synthetic passenger dataset
pub fn generate(config: &SyntheticConfig) -> Result<PassengerDataset> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
    let mut records = Vec::with_capacity(config.n_samples);
    let mut labels = Vec::with_capacity(config.n_samples);

    for _ in 0..config.n_samples {
        let pclass = *weighted_choice(&mut rng, &[(1u8, 0.24), (2, 0.21), (3, 0.55)]);
        let is_female = rng.gen::<f64>() < 0.35;
        let age = (29.7 + 14.5 * standard_normal(&mut rng)).clamp(0.42, 80.0);
        let sib_sp = *weighted_choice(
            &mut rng,
            &[(0u32, 0.68), (1, 0.23), (2, 0.05), (3, 0.02), (4, 0.01), (5, 0.005), (8, 0.005)],
        );
        let parch = *weighted_choice(
            &mut rng,
            &[(0u32, 0.76), (1, 0.13), (2, 0.08), (3, 0.01), (4, 0.01), (5, 0.005), (6, 0.005)],
        );
        let fare = (3.2 + standard_normal(&mut rng)).exp();
        let cabin = if rng.gen::<f64>() > 0.77 {
            let deck = DECKS[rng.gen_range(0..DECKS.len())];
            Some(format!("{}{}", deck, rng.gen_range(1..100)))
        } else {
            None
        };
        let embarked = if rng.gen::<f64>() < config.missing_embarked_rate {
            None
        } else {
            Some(weighted_choice(&mut rng, &[("C", 0.19), ("Q", 0.09), ("S", 0.72)]).to_string())
        };
        let name = passenger_name(&mut rng, is_female, age);

        let mut survival_prob: f64 = 0.0;
        if is_female {
            survival_prob += 0.5;
        }
        match pclass {
            1 => survival_prob += 0.4,
            2 => survival_prob += 0.2,
            _ => {}
        }
        if age < 16.0 {
            survival_prob += 0.3;
        }
        let survival_prob = (survival_prob / 1.2).clamp(0.05, 0.95);
        let survived = u8::from(rng.gen::<f64>() < survival_prob);

        let observed_age = if rng.gen::<f64>() < config.missing_age_rate {
            None
        } else {
            Some((age * 100.0).round() / 100.0)
        };

        records.push(RawRecord {
            pclass,
            sex: if is_female { "female" } else { "male" }.to_string(),
            age: observed_age,
            sib_sp,
            parch,
            fare: Some((fare * 10_000.0).round() / 10_000.0),
            embarked,
            name,
            cabin,
        });
        labels.push(survived);
    }

    PassengerDataset::new(records, labels)
}

/// Standard normal sample via Box-Muller
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

fn weighted_choice<'a, R: Rng, T>(rng: &mut R, choices: &'a [(T, f64)]) -> &'a T {
    let total: f64 = choices.iter().map(|(_, w)| w).sum();
    let mut target = rng.gen::<f64>() * total;
    for (value, weight) in choices {
        if target < *weight {
            return value;
        }
        target -= weight;
    }
    &choices[choices.len() - 1].0
}

fn passenger_name<R: Rng>(rng: &mut R, is_female: bool, age: f64) -> String {
    let surname = SURNAMES[rng.gen_range(0..SURNAMES.len())];
    let roll: f64 = rng.gen();

    let (title, given) = if is_female {
        let given = FEMALE_GIVEN[rng.gen_range(0..FEMALE_GIVEN.len())];
        let title = if roll < 0.01 {
            "Ms"
        } else if roll < 0.02 {
            "Mlle"
        } else if roll < 0.025 {
            *["Lady", "Countess", "Mme", "Dona"].choose(rng).unwrap_or(&"Lady")
        } else if age >= 25.0 && rng.gen::<f64>() < 0.7 {
            "Mrs"
        } else {
            "Miss"
        };
        (title, given)
    } else {
        let given = MALE_GIVEN[rng.gen_range(0..MALE_GIVEN.len())];
        let title = if age < 13.0 {
            "Master"
        } else if roll < 0.04 {
            *["Dr", "Rev", "Col", "Major", "Capt", "Sir", "Don", "Jonkheer"]
                .choose(rng)
                .unwrap_or(&"Dr")
        } else {
            "Mr"
        };
        (title, given)
    };

    // A small share of names carry no honorific at all
    if rng.gen::<f64>() < 0.01 {
        format!("{} {}", given, surname)
    } else {
        format!("{}, {}. {}", surname, title, given)
    }
}
