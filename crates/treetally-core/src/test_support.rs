use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::anyhow;

use crate::command_runner::{CommandOutput, CommandRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

#[derive(Default)]
pub struct RecordingRunner {
    outputs: Mutex<VecDeque<anyhow::Result<CommandOutput>>>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingRunner {
    pub fn from_outputs(outputs: Vec<anyhow::Result<CommandOutput>>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> anyhow::Result<CommandOutput> {
        self.calls.lock().expect("calls lock").push(Call {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.map(Path::to_path_buf),
        });

        self.outputs
            .lock()
            .expect("outputs lock")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("missing output")))
    }
}

pub fn output(stdout: &str, stderr: &str, status_code: i32) -> anyhow::Result<CommandOutput> {
    Ok(CommandOutput {
        status_code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    })
}
