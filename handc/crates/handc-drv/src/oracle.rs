//! Equivalence oracle (test-time).
//!
//! Compiles a program, runs the reference interpreter for (Ω_ref,
//! Σ_ref), executes the generated host-language program in an isolated
//! subprocess, and compares structurally. The two sides share no
//! memory; they exchange only JSON on standard output. Non-python
//! targets are reported as degraded after a generate-twice determinism
//! check.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

use handc_gen::{generate, Target};
use handc_ir::lower_program;

/// Default wall-clock timeout for the generated subprocess.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Oracle configuration.
#[derive(Clone, Debug)]
pub struct OracleConfig {
    /// Interpreter binary used to execute the generated program.
    pub python: String,
    /// Wall-clock timeout for one subprocess run.
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Verdict for one target.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// Ω and Σ agree with the reference interpreter.
    Pass,
    /// Observable behavior diverged.
    Fail { reason: String },
    /// The target was not executed; determinism-checked only.
    Degraded { reason: String },
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("source does not compile: {0} diagnostic(s)")]
    DoesNotCompile(usize),
    #[error("reference interpreter failed: {0}")]
    Reference(String),
    #[error("failed to run generated program: {0}")]
    Subprocess(String),
    #[error("generated program exceeded the {0:?} timeout")]
    Timeout(Duration),
    #[error("generated program produced malformed JSON: {0}")]
    MalformedOutput(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What the generated program prints on stdout.
#[derive(Debug, Deserialize)]
struct GeneratedOutput {
    outputs: Vec<String>,
    sigma: std::collections::BTreeMap<String, String>,
}

/// Reference observation: Ω plus Σ rendered to strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub outputs: Vec<String>,
    pub sigma: Vec<(String, String)>,
}

/// Run the reference interpreter and capture its observation.
pub fn observe_reference(source: &str, inputs: &[String]) -> Result<Observation, OracleError> {
    let result = handc_interp::run_source(source, inputs).map_err(|e| match e {
        handc_interp::RunError::Invalid(diags) => OracleError::DoesNotCompile(diags.len()),
        handc_interp::RunError::Runtime(err) => OracleError::Reference(err.to_string()),
    })?;
    let sigma = result
        .globals
        .iter()
        .map(|(name, value)| (name.clone(), value.render()))
        .collect();
    Ok(Observation {
        outputs: result.outputs,
        sigma,
    })
}

/// Compare a reference observation with a generated program's output.
/// Σ comparison is order-insensitive (structural equality of the
/// top-level frame).
pub fn compare_observations(reference: &Observation, outputs: &[String], sigma: &[(String, String)]) -> Verdict {
    if reference.outputs != outputs {
        return Verdict::Fail {
            reason: format!(
                "Ω mismatch: reference {:?}, generated {:?}",
                reference.outputs, outputs
            ),
        };
    }
    let mut ref_sigma: Vec<(String, String)> = reference.sigma.clone();
    ref_sigma.sort();
    let mut gen_sigma: Vec<(String, String)> = sigma.to_vec();
    gen_sigma.sort();
    if ref_sigma != gen_sigma {
        return Verdict::Fail {
            reason: format!("Σ mismatch: reference {ref_sigma:?}, generated {gen_sigma:?}"),
        };
    }
    Verdict::Pass
}

/// Full python-target equivalence check. The generated artifact is
/// written into `work_dir` and executed with the configured
/// interpreter.
pub fn check_python_equivalence(
    source: &str,
    inputs: &[String],
    work_dir: &Path,
    config: &OracleConfig,
) -> Result<Verdict, OracleError> {
    let reference = observe_reference(source, inputs)?;

    let ir = compile_to_ir(source)?;
    let (artifact, _notes) = generate(&ir, Target::Python)
        .map_err(|e| OracleError::Subprocess(e.to_string()))?;
    let program_path = work_dir.join("main.py");
    std::fs::write(&program_path, &artifact)?;

    let inputs_json =
        serde_json::to_string(inputs).expect("string list serialization cannot fail");
    let stdout = run_with_timeout(
        Command::new(&config.python)
            .arg(&program_path)
            .arg(inputs_json),
        config.timeout,
    )?;

    let generated: GeneratedOutput = serde_json::from_str(stdout.trim())
        .map_err(|e| OracleError::MalformedOutput(e.to_string()))?;
    let gen_sigma: Vec<(String, String)> = generated.sigma.into_iter().collect();
    Ok(compare_observations(
        &reference,
        &generated.outputs,
        &gen_sigma,
    ))
}

/// Degraded-target check: the backend must at least be deterministic
/// (two generations, identical bytes) on its accepted subset.
pub fn check_degraded(source: &str, target: Target) -> Result<Verdict, OracleError> {
    let ir = compile_to_ir(source)?;
    let first = generate(&ir, target);
    let second = generate(&ir, target);
    match (first, second) {
        (Ok((a, _)), Ok((b, _))) if a == b => Ok(Verdict::Degraded {
            reason: "determinism-checked but not executed".to_string(),
        }),
        (Ok(_), Ok(_)) => Ok(Verdict::Fail {
            reason: "generation is not deterministic".to_string(),
        }),
        (Err(e), _) | (_, Err(e)) => Ok(Verdict::Degraded {
            reason: format!("outside accepted subset: {e}"),
        }),
    }
}

fn compile_to_ir(source: &str) -> Result<handc_ir::Ir, OracleError> {
    let (tokens, lex_diags) = handc_lex::lex(source, "<oracle>");
    if !lex_diags.is_empty() {
        return Err(OracleError::DoesNotCompile(lex_diags.len()));
    }
    let (program, parse_diags) = handc_par::parse(&tokens, "<oracle>");
    if !parse_diags.is_empty() {
        return Err(OracleError::DoesNotCompile(parse_diags.len()));
    }
    Ok(lower_program(&program, "oracle"))
}

/// Run a command, polling for completion; kill it past the deadline.
fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<String, OracleError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| OracleError::Subprocess(e.to_string()))?;

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let mut stdout = String::new();
                if let Some(mut pipe) = child.stdout.take() {
                    pipe.read_to_string(&mut stdout)?;
                }
                if !status.success() {
                    let mut stderr = String::new();
                    if let Some(mut pipe) = child.stderr.take() {
                        pipe.read_to_string(&mut stderr)?;
                    }
                    return Err(OracleError::Subprocess(format!(
                        "exit status {status}: {}",
                        stderr.trim()
                    )));
                }
                return Ok(stdout);
            }
            Ok(None) => {
                if started.elapsed() >= timeout {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(OracleError::Timeout(timeout));
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => return Err(OracleError::Subprocess(e.to_string())),
        }
    }
}
