//! Gate demos: trains small sigmoid networks on truth tables and prints the
//! learned outputs.
//!
//! Usage: `strata-nn [xor|nand|adder|eq3|div3|all] [seed]`
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::error::Error;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use strata_nn::{
    train_loop, ActivationFunction, GradientMode, Matrix, Network, NetworkConfig, NetworkSpec,
    Topology, TrainConfig,
};

const DEMOS: [&str; 5] = ["xor", "nand", "adder", "eq3", "div3"];

/// One truth table plus the network shape and schedule used to learn it.
struct Demo {
    spec: NetworkSpec,
    rows: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
    epochs: usize,
}

impl Demo {
    fn new(name: &str) -> Option<Demo> {
        let sigmoid = |lr| NetworkConfig::new(ActivationFunction::Sigmoid, lr).with_hidden_bias(1.0);

        let demo = match name {
            "xor" => Demo {
                spec: NetworkSpec::new("xor", Topology::new(3, 1, 1, 2), sigmoid(0.5)),
                rows: bits(2),
                targets: bits(2).iter().map(|r| vec![bool_f(r[0] != r[1])]).collect(),
                epochs: 10_000,
            },
            "nand" => Demo {
                spec: NetworkSpec::new("nand", Topology::new(3, 1, 0, 0), sigmoid(0.5)),
                rows: bits(2),
                targets: bits(2).iter().map(|r| vec![bool_f(r[0] == 0.0 || r[1] == 0.0)]).collect(),
                epochs: 2_000,
            },
            // Half adder: outputs are (sum, carry).
            "adder" => Demo {
                spec: NetworkSpec::new("adder", Topology::new(3, 2, 1, 2), sigmoid(0.5)),
                rows: bits(2),
                targets: bits(2)
                    .iter()
                    .map(|r| vec![bool_f(r[0] != r[1]), bool_f(r[0] == 1.0 && r[1] == 1.0)])
                    .collect(),
                epochs: 10_000,
            },
            "eq3" => Demo {
                spec: NetworkSpec::new("eq3", Topology::new(4, 1, 2, 4), sigmoid(0.5)),
                rows: bits(3),
                targets: bits(3).iter().map(|r| vec![bool_f(r[0] == r[1] && r[1] == r[2])]).collect(),
                epochs: 10_000,
            },
            "div3" => Demo {
                spec: NetworkSpec::new(
                    "div3",
                    Topology::new(7, 1, 1, 5),
                    sigmoid(2.0).with_gradient(GradientMode::Mean),
                ),
                rows: bits(6),
                targets: (0..64).map(|n| vec![bool_f(n % 3 == 0)]).collect(),
                epochs: 20_000,
            },
            _ => return None,
        };
        Some(demo)
    }

    fn run(&self, rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
        let name = &self.spec.name;
        info!(demo = %name, epochs = self.epochs, "training");

        // Constant input column so the first layer learns a bias.
        let inputs = Matrix::from_rows(self.rows.clone())?.with_column(1.0);
        let targets = Matrix::from_rows(self.targets.clone())?;

        let mut network: Network = Network::from_spec(&self.spec, rng)?;
        let config = TrainConfig::new(self.epochs).with_log_every(self.epochs / 5);
        let loss = train_loop(&mut network, &inputs, &targets, &config)?;

        println!("\n{name} (final loss {loss:.6}):");
        println!("{network}");

        let outputs = network.forwards(&inputs)?;
        for (row, out) in self.rows.iter().zip(outputs.iter_rows()) {
            let bits: Vec<String> = row.iter().map(|b| format!("{b}")).collect();
            let values: Vec<String> = out.iter().map(|v| format!("{v:.3}")).collect();
            println!("[ {} ] => [ {} ]", bits.join(" "), values.join(" "));
        }
        Ok(())
    }
}

fn bool_f(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Every `width`-bit pattern, most significant bit first.
fn bits(width: usize) -> Vec<Vec<f64>> {
    (0..1usize << width)
        .map(|n| (0..width).rev().map(|bit| ((n >> bit) & 1) as f64).collect())
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let which = args.next().unwrap_or_else(|| "all".to_owned());
    let mut rng = match args.next() {
        Some(seed) => StdRng::seed_from_u64(seed.parse()?),
        None => StdRng::from_entropy(),
    };

    let names: Vec<&str> = if which == "all" {
        DEMOS.to_vec()
    } else {
        vec![which.as_str()]
    };

    for name in names {
        let Some(demo) = Demo::new(name) else {
            eprintln!("unknown demo '{name}', expected one of: {} or all", DEMOS.join(", "));
            std::process::exit(2);
        };
        demo.run(&mut rng)?;
    }
    Ok(())
}
