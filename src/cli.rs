use crate::prism::types::VmSpec;
use crate::step::VmOperation;
use clap::ArgAction;
use clap::builder::BoolishValueParser;
use secrecy::SecretString;
use std::convert::Infallible;
use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(
    name = "vm-step",
    version,
    about = "CI build step that creates, powers on or deletes a Nutanix VM through Prism"
)]
pub struct Cli {
    #[arg(short, long, help = "Operation to perform", env = "VM_OPERATION")]
    pub operation: VmOperation,
    #[arg(short = 'n', long, help = "Display name of the VM", env = "VM_NAME")]
    pub vm_name: String,
    #[arg(
        short,
        long,
        help = "UUID of the disk image to clone, required for `create`",
        env = "IMAGE_UUID"
    )]
    pub image_uuid: Option<String>,
    #[arg(long, help = "Memory of a created VM in megabytes", default_value_t = VmSpec::DEFAULT_MEMORY_MB)]
    pub memory_mb: u32,
    #[arg(long, help = "Virtual CPUs of a created VM", default_value_t = VmSpec::DEFAULT_VCPUS)]
    pub vcpus: u32,
    #[arg(long, help = "Cores per virtual CPU of a created VM", default_value_t = VmSpec::DEFAULT_CORES_PER_VCPU)]
    pub cores_per_vcpu: u32,

    #[arg(long, help = "Prism cluster IP or host name", env = "PRISM_CLUSTER_IP")]
    pub cluster_ip: Option<String>,
    #[arg(long, help = "Prism username", env = "PRISM_USERNAME")]
    pub username: Option<String>,
    #[arg(
        long,
        help = "Prism password",
        env = "PRISM_PASSWORD",
        hide_env_values = true,
        value_parser = secret
    )]
    pub password: Option<SecretString>,
    #[arg(
        long,
        help = "Skip TLS certificate and host name verification for the cluster",
        env = "PRISM_INSECURE",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub insecure: bool,
    #[arg(short, long, help = "Optional YAML configuration file", env = "PRISM_CONFIG")]
    pub config: Option<PathBuf>,
}

fn secret(value: &str) -> Result<SecretString, Infallible> {
    Ok(value.into())
}
