use std::f64::consts::PI;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use log::info;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

/// A GRAPHTEC-style export: vendor preamble, interval line, marker line,
/// header, units row, then comma-separated samples.
fn graphtec_csv(rng: &mut SimpleRng, samples: usize, interval: f64) -> String {
    let mut out = String::new();
    out.push_str("GRAPHTEC,GL240,Ver1.00\n");
    out.push_str(&format!("測定間隔,{interval}s\n"));
    out.push_str("アンプ設定,加速度\n");
    out.push_str("測定値\n");
    out.push_str("番号,日時,X,Y,Z\n");
    out.push_str(",,m/s2,m/s2,m/s2\n");

    for i in 0..samples {
        let t = i as f64 * interval;
        let x = (2.0 * PI * 10.0 * t).sin() + rng.gauss(0.0, 0.02);
        let y = (2.0 * PI * 20.0 * t).sin() + rng.gauss(0.0, 0.02);
        let z = (2.0 * PI * 30.0 * t).sin() + rng.gauss(0.0, 0.02);
        let _ = writeln!(out, "{},2024/04/01 00:00:00,{x:.5},{y:.5},{z:.5}", i + 1);
    }
    out
}

/// A plain header-and-rows CSV with no vendor preamble, for exercising the
/// ambiguous-format path.
fn plain_csv(rng: &mut SimpleRng, samples: usize, interval: f64) -> String {
    let mut out = String::from("time,value\n");
    for i in 0..samples {
        let t = i as f64 * interval;
        let v = 0.8 * (2.0 * PI * 5.0 * t).sin() + rng.gauss(0.0, 0.01);
        let _ = writeln!(out, "{t:.4},{v:.5}");
    }
    out
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let graphtec_path = "sample_graphtec.csv";
    std::fs::write(graphtec_path, graphtec_csv(&mut rng, 1024, 0.01))
        .with_context(|| format!("writing {graphtec_path}"))?;
    info!("wrote {graphtec_path}");

    let plain_path = "sample_plain.csv";
    std::fs::write(plain_path, plain_csv(&mut rng, 512, 0.02))
        .with_context(|| format!("writing {plain_path}"))?;
    info!("wrote {plain_path}");

    println!("Wrote {graphtec_path} (1024 samples) and {plain_path} (512 samples)");
    Ok(())
}
