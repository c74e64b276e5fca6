use rayon::prelude::*;

use super::Aggregator;

const CHUNK_SIZE: usize = 4096;

/// Federated averaging, the elementwise arithmetic mean of the contributions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FedAvg;

impl Aggregator for FedAvg {
    fn aggregate(&self, contributions: &[&[f32]], out: &mut [f32]) {
        let n = contributions.len() as f32;

        out.par_chunks_mut(CHUNK_SIZE)
            .enumerate()
            .for_each(|(i, chunk)| {
                let start = i * CHUNK_SIZE;
                chunk.fill(0.0);

                for params in contributions {
                    let params = &params[start..start + chunk.len()];
                    chunk.iter_mut().zip(params).for_each(|(o, p)| *o += p);
                }

                chunk.iter_mut().for_each(|o| *o /= n);
            });
    }
}
