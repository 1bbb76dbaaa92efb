use rand::{rngs::StdRng, Rng, SeedableRng};

/// Labelled samples held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub inputs: Vec<Vec<f64>>,
    pub targets: Vec<usize>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Splits off the last `pct` percent of samples as a second dataset.
    pub fn split(mut self, pct: u8) -> (Dataset, Dataset) {
        let pct = pct.min(100) as usize;
        let tail = self.len() * pct / 100;
        let at = self.len() - tail;
        let rest = Dataset {
            inputs: self.inputs.split_off(at),
            targets: self.targets.split_off(at),
        };
        (self, rest)
    }
}

/// Gaussian blobs: one cluster per class, centred on a one-hot-like point in
/// `features` dimensions. Seeded, so the same arguments always produce the
/// same samples.
pub fn gaussian_blobs(
    samples_per_class: usize,
    num_classes: usize,
    features: usize,
    spread: f64,
    seed: u64,
) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut inputs = Vec::with_capacity(samples_per_class * num_classes);
    let mut targets = Vec::with_capacity(samples_per_class * num_classes);

    for _ in 0..samples_per_class {
        for class in 0..num_classes {
            let row = (0..features)
                .map(|f| {
                    let centre = if f % num_classes == class { 1.0 } else { 0.0 };
                    centre + (rng.gen::<f64>() * 2.0 - 1.0) * spread
                })
                .collect();
            inputs.push(row);
            targets.push(class);
        }
    }

    Dataset { inputs, targets }
}
