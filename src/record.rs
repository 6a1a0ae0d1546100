//! JSON-lines run records, appended by the root PE after a run.

use crate::pipeline::ChainRun;
use crate::printer::{ENGINE_TAG, PROBLEM_TAG};

use json::JsonValue;
use std::collections::HashMap;
use std::env;
use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const ENV_PREFIXES: [&str; 2] = ["CHAIN", "LAMELLAR"];

pub struct RunRecord {
    pub name: String,
    parameters: Vec<String>,
    run_date: String,
    output: HashMap<String, String>,
    slurm_params: HashMap<String, String>,
    system: HashMap<String, String>,
    environment_vars: HashMap<String, String>,
}

impl RunRecord {
    /// Record named after the running executable.
    pub fn new() -> Self {
        Self::with_name(&default_record_name())
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parameters: env::args().skip(1).collect(),
            run_date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            output: HashMap::new(),
            slurm_params: collect_env_vars(&["SLURM"]),
            system: system_info(),
            environment_vars: collect_env_vars(&ENV_PREFIXES),
        }
    }

    pub fn with_output(&mut self, key: &str, value: String) {
        self.output.insert(key.to_string(), value);
    }

    /// Fill the output section from a finished run.
    pub fn with_run(&mut self, run: &ChainRun) {
        self.with_output("engine", ENGINE_TAG.to_string());
        self.with_output("problem", PROBLEM_TAG.to_string());
        self.with_output("nelts", run.params.nelts.to_string());
        self.with_output("seed", run.params.seed.to_string());
        self.with_output("thresh_percent", run.params.thresh_percent.to_string());
        self.with_output("winnow_nelts", run.params.winnow_nelts.to_string());
        self.with_output("num_pes", run.num_pes.to_string());
        self.with_output("elapsed_secs", format!("{:.9}", run.elapsed.as_secs_f64()));
        for (stage, secs) in run.stages.named() {
            self.with_output(&format!("{stage}_secs"), format!("{:.9}", secs.as_secs_f64()));
        }
    }

    pub fn as_json(&self) -> JsonValue {
        json::object! {
            "name" => self.name.clone(),
            "parameters" => self.parameters.clone(),
            "run_date" => self.run_date.clone(),
            "output" => self.output.clone(),
            "system" => self.system.clone(),
            "environment" => self.environment_vars.clone(),
            "slurm_params" => self.slurm_params.clone(),
        }
    }

    /// Append the record as one line to `file`, creating it and its parent
    /// directories if needed.
    pub fn write(&self, file: &Path) -> io::Result<()> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = OpenOptions::new().create(true).append(true).open(file)?;
        writeln!(f, "{}", json::stringify(self.as_json()))
    }

    /// `<root>/<name>_<slurm job id or timestamp>_result.jsonl`
    pub fn default_output_path(&self, root: &Path) -> PathBuf {
        let time = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let id = self.slurm_params.get("SLURM_JOB_ID").unwrap_or(&time);
        root.join(format!("{}_{id}_result.jsonl", self.name))
    }
}

impl Default for RunRecord {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_env_vars(prefixes: &[&str]) -> HashMap<String, String> {
    env::vars()
        .filter(|(key, _)| prefixes.iter().any(|p| key.starts_with(p)))
        .collect()
}

fn system_info() -> HashMap<String, String> {
    let mut system_info = HashMap::new();
    let mut sys = sysinfo::System::new();
    sys.refresh_cpu();
    sys.refresh_memory();

    if let Some(os_name) = sysinfo::System::name() {
        system_info.insert("os_name".to_string(), os_name);
    }
    if let Some(kernel_version) = sysinfo::System::kernel_version() {
        system_info.insert("kernel_version".to_string(), kernel_version);
    }
    if let Some(hostname) = sysinfo::System::host_name() {
        system_info.insert("hostname".to_string(), hostname);
    }
    system_info.insert("cpu_cores".to_string(), sys.cpus().len().to_string());
    if let Some(cpu) = sys.cpus().first() {
        system_info.insert("cpu_brand".to_string(), cpu.brand().to_string());
    }
    system_info.insert("ram_bytes".to_string(), sys.total_memory().to_string());
    system_info
}

fn default_record_name() -> String {
    env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::file_stem)
        .unwrap_or(OsStr::new("chain"))
        .to_string_lossy()
        .to_string()
}
