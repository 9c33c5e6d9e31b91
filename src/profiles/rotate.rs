use std::env;
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub(crate) enum RotateError {
    #[error("failed to run {0:?}: {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("`{0}` failed: {1}")]
    CommandFailed(String, String),
    #[error("unexpected output from `{0}`: {1:?}")]
    UnexpectedOutput(String, String),
}

/// A freshly created access key pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AccessKey {
    pub(crate) access_key_id: String,
    pub(crate) secret_access_key: String,
}

/// Seam for the remote identity service. The production implementation
/// drives the `aws` CLI; tests substitute a fake.
pub(crate) trait AccessKeyRotator {
    fn create_access_key(&self, user: &str) -> Result<AccessKey, RotateError>;
    fn delete_access_key(&self, user: &str, access_key_id: &str) -> Result<(), RotateError>;
}

pub(crate) fn get_aws_binary() -> String {
    env::var("AWS_CLI_PATH").unwrap_or_else(|_| String::from("aws"))
}

pub(crate) struct AwsCommand {
    pub(crate) args: Vec<String>,
}

impl AwsCommand {
    pub(crate) fn new_iam_command(subcommand: &str) -> Self {
        let mut args = Vec::with_capacity(10);
        args.push(get_aws_binary());
        args.push("iam".to_string());
        args.push(subcommand.to_string());

        AwsCommand { args }
    }

    pub(crate) fn add<S>(&mut self, arg: S)
    where
        S: Into<String>,
    {
        self.args.push(arg.into());
    }

    pub(crate) fn add_slice(&mut self, args: &[&str]) {
        self.args.reserve(args.len());
        for arg in args {
            self.args.push(arg.to_string())
        }
    }

    pub(crate) fn to_command_line(&self) -> String {
        self.args.join(" ")
    }

    /// Runs the command, waits for it, and returns its stdout. A non-zero
    /// exit status becomes an error carrying the CLI's stderr.
    fn output(&self) -> Result<String, RotateError> {
        let output = Command::new(&self.args[0])
            .args(&self.args[1..])
            .output()
            .map_err(|e| RotateError::Spawn(self.args[0].clone(), e))?;

        if !output.status.success() {
            return Err(RotateError::CommandFailed(
                self.to_command_line(),
                String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Rotates access keys through the `aws` CLI as a child process.
pub(crate) struct AwsCliRotator;

impl AccessKeyRotator for AwsCliRotator {
    fn create_access_key(&self, user: &str) -> Result<AccessKey, RotateError> {
        let mut cmd = AwsCommand::new_iam_command("create-access-key");
        cmd.add("--user-name");
        cmd.add(user);
        // `--output text` with this query prints "<id>\t<secret>\n"
        cmd.add_slice(&[
            "--output",
            "text",
            "--query",
            "AccessKey.[AccessKeyId,SecretAccessKey]",
        ]);

        let stdout = cmd.output()?;
        let mut fields = stdout.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(id), Some(secret)) => Ok(AccessKey {
                access_key_id: id.to_string(),
                secret_access_key: secret.to_string(),
            }),
            _ => Err(RotateError::UnexpectedOutput(
                cmd.to_command_line(),
                stdout.trim_end().to_string(),
            )),
        }
    }

    fn delete_access_key(&self, user: &str, access_key_id: &str) -> Result<(), RotateError> {
        let mut cmd = AwsCommand::new_iam_command("delete-access-key");
        cmd.add("--user-name");
        cmd.add(user);
        cmd.add("--access-key-id");
        cmd.add(access_key_id);

        cmd.output().map(|_| ())
    }
}
