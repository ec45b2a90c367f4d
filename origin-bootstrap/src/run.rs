//! One-shot `docker run` invocations
use crate::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Builder for a container that runs to completion
///
/// ```
/// use origin_bootstrap::Runner;
///
/// let runner = Runner::new()
///     .image("openshift/origin:latest")
///     .discard_container()
///     .entrypoint("oc")
///     .command(["version"]);
/// assert_eq!(
///     runner.args().unwrap(),
///     ["run", "--rm", "--entrypoint", "oc", "openshift/origin:latest", "version"]
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Runner {
    program: String,
    image: Option<String>,
    privileged: bool,
    remove: bool,
    host_network: bool,
    host_pid: bool,
    binds: Vec<String>,
    env: Vec<String>,
    entrypoint: Option<String>,
    command: Vec<String>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// A runner using `docker` from `PATH`
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// A runner using another docker-compatible executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            image: None,
            privileged: false,
            remove: false,
            host_network: false,
            host_pid: false,
            binds: Vec::new(),
            env: Vec::new(),
            entrypoint: None,
            command: Vec::new(),
        }
    }

    /// Image to run
    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Run the container privileged
    #[must_use]
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Remove the container once it exits
    #[must_use]
    pub fn discard_container(mut self) -> Self {
        self.remove = true;
        self
    }

    /// Share the host network namespace
    #[must_use]
    pub fn host_network(mut self) -> Self {
        self.host_network = true;
        self
    }

    /// Share the host PID namespace
    #[must_use]
    pub fn host_pid(mut self) -> Self {
        self.host_pid = true;
        self
    }

    /// Add `host:container[:options]` volume binds
    #[must_use]
    pub fn bind<I, S>(mut self, binds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.binds.extend(binds.into_iter().map(Into::into));
        self
    }

    /// Add `NAME=value` environment entries
    #[must_use]
    pub fn env<I, S>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env.extend(env.into_iter().map(Into::into));
        self
    }

    /// Override the image entrypoint
    #[must_use]
    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    /// Arguments passed to the entrypoint
    #[must_use]
    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command.extend(command.into_iter().map(Into::into));
        self
    }

    /// The `docker` argument vector for this container
    pub fn args(&self) -> Result<Vec<String>> {
        let image = self.image.as_ref().ok_or(Error::MissingImage)?;
        let mut args = vec!["run".to_owned()];
        if self.privileged {
            args.push("--privileged".into());
        }
        if self.remove {
            args.push("--rm".into());
        }
        if self.host_network {
            args.push("--net=host".into());
        }
        if self.host_pid {
            args.push("--pid=host".into());
        }
        for bind in &self.binds {
            args.extend(["-v".into(), bind.clone()]);
        }
        for env in &self.env {
            args.extend(["-e".into(), env.clone()]);
        }
        if let Some(entrypoint) = &self.entrypoint {
            args.extend(["--entrypoint".into(), entrypoint.clone()]);
        }
        args.push(image.clone());
        args.extend(self.command.iter().cloned());
        Ok(args)
    }

    /// Run the container to completion and return its stdout and stderr
    pub async fn run(&self) -> Result<(String, String)> {
        let args = self.args()?;
        debug!(program = %self.program, ?args, "running container");
        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(Error::Run {
                status: output.status,
                stderr,
            });
        }
        Ok((stdout, stderr))
    }
}
