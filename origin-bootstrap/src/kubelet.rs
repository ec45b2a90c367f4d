//! Initial node configuration
use crate::{Error, Result, Runner};
use std::{io::Write, path::PathBuf};
use tracing::info;

/// Where the node image writes its configuration
const NODE_CONFIG_DIR: &str = "/var/lib/origin/openshift.local.config";

/// How to generate the configuration of a node
#[derive(Clone, Debug, Default)]
pub struct NodeStartConfig {
    /// Extra `local/path:image/path` binds
    pub container_binds: Vec<String>,
    /// The image containing `oc`
    pub node_image: String,
    /// Extra arguments for `oc adm create-node-config`
    pub args: Vec<String>,
}

impl NodeStartConfig {
    /// Run `oc adm create-node-config` inside the node image
    ///
    /// Returns the local directory the configuration was written to.
    pub async fn make_node_config<W: Write>(&self, runner: Runner, out: &mut W) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix("oc-cluster-up-control-plane-node-")
            .tempdir()
            .map(tempfile::TempDir::keep)
            .map_err(|source| Error::CreateDir {
                path: std::env::temp_dir(),
                source,
            })?;

        let mut binds = self.container_binds.clone();
        binds.push(format!("{}:{NODE_CONFIG_DIR}:z", dir.display()));

        writeln!(out, "Creating initial OpenShift node configuration").map_err(Error::Output)?;
        let mut command = vec![
            "adm".to_owned(),
            "create-node-config".to_owned(),
            format!("--node-dir={NODE_CONFIG_DIR}"),
        ];
        command.extend(self.args.iter().cloned());

        runner
            .image(&self.node_image)
            .privileged()
            .discard_container()
            .host_network()
            .host_pid()
            .bind(binds)
            .entrypoint("oc")
            .command(command)
            .run()
            .await
            .map_err(|err| Error::NodeConfig(Box::new(err)))?;
        info!(dir = %dir.display(), "created node configuration");
        Ok(dir)
    }
}
