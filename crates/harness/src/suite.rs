//! The benchmark suite and the on-disk layout of kernel binaries.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Variant directory holding the trusted reference binaries.
pub const REFERENCE_VARIANT: &str = "ref";

/// Full suite, as `category/name` paths mirroring the binary tree.
pub const BENCHMARKS: &[&str] = &[
    "datamining/correlation",
    "datamining/covariance",
    "linear-algebra/blas/gemm",
    "linear-algebra/blas/gemver",
    "linear-algebra/blas/gesummv",
    "linear-algebra/blas/symm",
    "linear-algebra/blas/syr2k",
    "linear-algebra/blas/syrk",
    "linear-algebra/blas/trmm",
    "linear-algebra/kernels/2mm",
    "linear-algebra/kernels/3mm",
    "linear-algebra/kernels/atax",
    "linear-algebra/kernels/bicg",
    "linear-algebra/kernels/doitgen",
    "linear-algebra/kernels/mvt",
    "linear-algebra/solvers/cholesky",
    "linear-algebra/solvers/durbin",
    "linear-algebra/solvers/gramschmidt",
    "linear-algebra/solvers/lu",
    "linear-algebra/solvers/ludcmp",
    "linear-algebra/solvers/trisolv",
    "medley/deriche",
    "medley/floyd-warshall",
    "medley/nussinov",
    "stencils/adi",
    "stencils/fdtd-2d",
    "stencils/heat-3d",
    "stencils/jacobi-1d",
    "stencils/jacobi-2d",
    "stencils/seidel-2d",
];

/// Curated subset selected by the `important` alias: the kernels most
/// sensitive to the optimizations under evaluation.
pub const IMPORTANT: &[&str] = &[
    "correlation",
    "covariance",
    "gemm",
    "gemver",
    "gesummv",
    "syrk",
    "2mm",
    "3mm",
    "atax",
    "bicg",
    "doitgen",
    "mvt",
    "gramschmidt",
    "trisolv",
];

/// Trailing path component, used as the user-facing benchmark name.
pub fn short_name(benchmark: &str) -> &str {
    benchmark.rsplit('/').next().unwrap_or(benchmark)
}

/// Resolve user-supplied benchmark names to suite paths.
///
/// Accepts short names (`gemm`), the `all` and `important` aliases, and
/// returns the selection in suite order with duplicates removed. Unknown
/// names are an error listing the available set.
pub fn resolve(names: &[String]) -> Result<Vec<&'static str>> {
    let mut selected = vec![false; BENCHMARKS.len()];
    for name in names {
        match name.as_str() {
            "all" => selected.iter_mut().for_each(|s| *s = true),
            "important" => {
                for (i, benchmark) in BENCHMARKS.iter().enumerate() {
                    if IMPORTANT.contains(&short_name(benchmark)) {
                        selected[i] = true;
                    }
                }
            }
            _ => {
                let index = BENCHMARKS
                    .iter()
                    .position(|benchmark| short_name(benchmark) == name);
                match index {
                    Some(i) => selected[i] = true,
                    None => {
                        let available: Vec<&str> =
                            BENCHMARKS.iter().map(|b| short_name(b)).collect();
                        bail!(
                            "unknown benchmark `{name}`; available: {}",
                            available.join(", ")
                        );
                    }
                }
            }
        }
    }
    Ok(BENCHMARKS
        .iter()
        .zip(&selected)
        .filter(|(_, s)| **s)
        .map(|(b, _)| *b)
        .collect())
}

/// Filesystem layout of the compiled kernel binaries:
/// `<root>/<variant>/check/<benchmark>` for verification and
/// `<root>/<variant>/run/<benchmark>` for timing.
#[derive(Debug, Clone)]
pub struct BinLayout {
    root: PathBuf,
}

impl BinLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn check_exec(&self, variant: &str, benchmark: &str) -> PathBuf {
        self.root.join(variant).join("check").join(benchmark)
    }

    pub fn run_exec(&self, variant: &str, benchmark: &str) -> PathBuf {
        self.root.join(variant).join("run").join(benchmark)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
