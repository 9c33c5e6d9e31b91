pub(crate) mod logger;
pub(crate) mod rotate;

use std::env;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::ini_file::{IniFile, IoError, Section};

use self::rotate::{AccessKeyRotator, RotateError};

pub(crate) const ACCESS_KEY_ID: &str = "aws_access_key_id";
pub(crate) const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";

const CREDENTIALS_FILE_VAR: &str = "AWS_SHARED_CREDENTIALS_FILE";

#[derive(Debug, thiserror::Error)]
pub(crate) enum RuntimeError {
    #[error("could not determine home directory")]
    HomeNotFound,
    #[error("could not load {0:?}: {1}")]
    Load(PathBuf, #[source] IoError),
    #[error("could not write {0:?}: {1}")]
    Save(PathBuf, #[source] IoError),
    #[error("could not find profile {0:?}")]
    UnknownProfile(String),
    #[error("profile {0:?} is missing {1}")]
    MissingCredential(String, &'static str),
    #[error("rotating keys for {0:?} failed: {1}")]
    Rotation(String, #[source] RotateError),
}

/// The profiles of one AWS shared credentials file. Each `[section]` is one
/// profile; the section name is the profile name.
#[derive(Debug)]
pub(crate) struct Profiles {
    creds: IniFile,
}

impl Profiles {
    /// `$AWS_SHARED_CREDENTIALS_FILE` if set, otherwise `~/.aws/credentials`.
    pub(crate) fn default_path() -> Result<PathBuf, RuntimeError> {
        if let Some(path) = env::var_os(CREDENTIALS_FILE_VAR) {
            return Ok(PathBuf::from(path));
        }

        match dirs::home_dir() {
            Some(home) => Ok(home.join(".aws").join("credentials")),
            None => Err(RuntimeError::HomeNotFound),
        }
    }

    pub(crate) fn load(path: Option<&Path>) -> Result<Self, RuntimeError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        debug!("Loading credentials file {path:?}");

        let creds =
            IniFile::load_from_path(&path).map_err(|e| RuntimeError::Load(path.clone(), e))?;

        Ok(Profiles { creds })
    }

    /// Profile names, sorted for stable `list` output.
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names = self.creds.section_names();
        names.sort_unstable();
        names
    }

    pub(crate) fn get(&self, name: &str) -> Result<&Section, RuntimeError> {
        self.creds
            .section(name)
            .ok_or_else(|| RuntimeError::UnknownProfile(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Section, RuntimeError> {
        self.creds
            .section_mut(name)
            .ok_or_else(|| RuntimeError::UnknownProfile(name.to_string()))
    }

    pub(crate) fn save(&self) -> Result<(), RuntimeError> {
        debug!("Writing credentials file {:?}", self.creds.path());

        self.creds
            .save()
            .map_err(|e| RuntimeError::Save(self.creds.path().clone(), e))
    }

    /// The `export` lines a shell evaluates to activate a profile. Fails if
    /// either credential key is absent; that check lives here, not in the
    /// INI engine.
    pub(crate) fn activation_exports(&self, name: &str) -> Result<Vec<String>, RuntimeError> {
        let profile = self.get(name)?;

        let access_key_id = profile
            .get(ACCESS_KEY_ID)
            .ok_or(RuntimeError::MissingCredential(
                name.to_string(),
                ACCESS_KEY_ID,
            ))?;
        let secret_access_key =
            profile
                .get(SECRET_ACCESS_KEY)
                .ok_or(RuntimeError::MissingCredential(
                    name.to_string(),
                    SECRET_ACCESS_KEY,
                ))?;

        Ok(vec![
            format!("export AWS_DEFAULT_PROFILE={}", profile.name()),
            format!("export AWS_ACCESS_KEY_ID={access_key_id}"),
            format!("export AWS_SECRET_ACCESS_KEY={secret_access_key}"),
        ])
    }

    /// Rotates the access keys of every named profile for `user`, then
    /// writes the file back once. A profile that cannot be rotated is
    /// skipped with a warning so the rest of the batch still goes through.
    pub(crate) fn update_all(
        &mut self,
        rotator: &dyn AccessKeyRotator,
        user: &str,
        names: &[&str],
    ) -> Result<(), RuntimeError> {
        for &name in names {
            match self.update_one(rotator, user, name) {
                Ok(()) => debug!("Updated profile {name:?}"),
                Err(e) => warn!("Skipping profile {name:?}: {e}"),
            }
        }

        self.save()
    }

    fn update_one(
        &mut self,
        rotator: &dyn AccessKeyRotator,
        user: &str,
        name: &str,
    ) -> Result<(), RuntimeError> {
        let profile = self.get_mut(name)?;

        let old_access_key_id = match profile.get(ACCESS_KEY_ID) {
            Some(id) => id.to_string(),
            None => {
                return Err(RuntimeError::MissingCredential(
                    name.to_string(),
                    ACCESS_KEY_ID,
                ))
            }
        };
        if !profile.has_key(SECRET_ACCESS_KEY) {
            return Err(RuntimeError::MissingCredential(
                name.to_string(),
                SECRET_ACCESS_KEY,
            ));
        }

        let fresh = rotator
            .create_access_key(user)
            .map_err(|e| RuntimeError::Rotation(name.to_string(), e))?;

        // The fresh pair must not be lost if the delete fails; the stale key
        // then simply stays behind on the remote side.
        if let Err(e) = rotator.delete_access_key(user, &old_access_key_id) {
            warn!("Could not delete old access key {old_access_key_id} of {name:?}: {e}");
        }

        profile.set(ACCESS_KEY_ID, fresh.access_key_id);
        profile.set(SECRET_ACCESS_KEY, fresh.secret_access_key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::fs;

    use serial_test::serial;

    use super::rotate::AccessKey;

    fn write_credentials(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("credentials");
        fs::write(&path, content).unwrap();
        path
    }

    struct FakeRotator {
        fail_create: bool,
        deleted: RefCell<Vec<(String, String)>>,
    }

    impl FakeRotator {
        fn new() -> Self {
            FakeRotator {
                fail_create: false,
                deleted: RefCell::new(Vec::new()),
            }
        }
    }

    impl AccessKeyRotator for FakeRotator {
        fn create_access_key(&self, user: &str) -> Result<AccessKey, RotateError> {
            if self.fail_create {
                return Err(RotateError::CommandFailed("fake".into(), "boom".into()));
            }

            Ok(AccessKey {
                access_key_id: format!("NEW-{user}"),
                secret_access_key: format!("NEWSECRET-{user}"),
            })
        }

        fn delete_access_key(&self, user: &str, access_key_id: &str) -> Result<(), RotateError> {
            self.deleted
                .borrow_mut()
                .push((user.to_string(), access_key_id.to_string()));

            Ok(())
        }
    }

    mod default_path {
        use super::*;

        #[test]
        #[serial]
        fn test_env_var_takes_precedence() {
            env::set_var(CREDENTIALS_FILE_VAR, "/tmp/other-credentials");

            assert_eq!(
                Profiles::default_path().unwrap(),
                PathBuf::from("/tmp/other-credentials")
            );

            env::remove_var(CREDENTIALS_FILE_VAR);
        }

        #[test]
        #[serial]
        fn test_falls_back_to_home() {
            env::remove_var(CREDENTIALS_FILE_VAR);

            let path = Profiles::default_path().unwrap();

            assert!(path.ends_with(".aws/credentials"));
        }
    }

    mod load {
        use super::*;

        #[test]
        fn test_missing_file_fails() {
            let dir = tempfile::tempdir().unwrap();

            let result = Profiles::load(Some(&dir.path().join("nope")));

            assert!(matches!(result, Err(RuntimeError::Load(..))));
        }

        #[test]
        fn test_names_are_sorted() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_credentials(&dir, "[work]\nk=v\n\n[default]\nk=v\n\n[ci]\nk=v\n\n");

            let profiles = Profiles::load(Some(&path)).unwrap();

            assert_eq!(profiles.names(), vec!["ci", "default", "work"]);
        }

        #[test]
        fn test_unknown_profile_lookup_fails() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_credentials(&dir, "[default]\nk=v\n\n");

            let profiles = Profiles::load(Some(&path)).unwrap();

            assert!(matches!(
                profiles.get("staging"),
                Err(RuntimeError::UnknownProfile(_))
            ));
        }
    }

    mod activation_exports {
        use super::*;

        #[test]
        fn test_emits_all_three_exports() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_credentials(
                &dir,
                "[default]\naws_access_key_id=AKID\naws_secret_access_key=SECRET\n\n",
            );

            let profiles = Profiles::load(Some(&path)).unwrap();

            assert_eq!(
                profiles.activation_exports("default").unwrap(),
                vec![
                    "export AWS_DEFAULT_PROFILE=default",
                    "export AWS_ACCESS_KEY_ID=AKID",
                    "export AWS_SECRET_ACCESS_KEY=SECRET",
                ]
            );
        }

        #[test]
        fn test_missing_access_key_id_fails() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_credentials(&dir, "[default]\naws_secret_access_key=SECRET\n\n");

            let profiles = Profiles::load(Some(&path)).unwrap();

            assert!(matches!(
                profiles.activation_exports("default"),
                Err(RuntimeError::MissingCredential(_, ACCESS_KEY_ID))
            ));
        }

        #[test]
        fn test_missing_secret_fails() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_credentials(&dir, "[default]\naws_access_key_id=AKID\n\n");

            let profiles = Profiles::load(Some(&path)).unwrap();

            assert!(matches!(
                profiles.activation_exports("default"),
                Err(RuntimeError::MissingCredential(_, SECRET_ACCESS_KEY))
            ));
        }
    }

    mod update_all {
        use super::*;

        #[test]
        fn test_rotates_and_saves() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_credentials(
                &dir,
                "[default]\naws_access_key_id=OLD\naws_secret_access_key=OLDSECRET\n\n",
            );

            let mut profiles = Profiles::load(Some(&path)).unwrap();
            let rotator = FakeRotator::new();
            profiles
                .update_all(&rotator, "deploy", &["default"])
                .unwrap();

            assert_eq!(
                *rotator.deleted.borrow(),
                vec![("deploy".to_string(), "OLD".to_string())]
            );

            let reloaded = Profiles::load(Some(&path)).unwrap();
            let profile = reloaded.get("default").unwrap();
            assert_eq!(profile.get(ACCESS_KEY_ID), Some("NEW-deploy"));
            assert_eq!(profile.get(SECRET_ACCESS_KEY), Some("NEWSECRET-deploy"));
        }

        #[test]
        fn test_failing_profile_is_skipped_not_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_credentials(
                &dir,
                "[default]\naws_access_key_id=OLD\naws_secret_access_key=OLDSECRET\n\n",
            );

            let mut profiles = Profiles::load(Some(&path)).unwrap();
            let rotator = FakeRotator {
                fail_create: true,
                deleted: RefCell::new(Vec::new()),
            };

            profiles
                .update_all(&rotator, "deploy", &["default"])
                .unwrap();

            // nothing rotated, nothing deleted, old keys still on disk
            assert!(rotator.deleted.borrow().is_empty());
            let reloaded = Profiles::load(Some(&path)).unwrap();
            assert_eq!(
                reloaded.get("default").unwrap().get(ACCESS_KEY_ID),
                Some("OLD")
            );
        }

        #[test]
        fn test_profile_without_credentials_is_skipped() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_credentials(
                &dir,
                "[empty]\nregion=eu-west-1\n\n[default]\naws_access_key_id=OLD\naws_secret_access_key=OLDSECRET\n\n",
            );

            let mut profiles = Profiles::load(Some(&path)).unwrap();
            let rotator = FakeRotator::new();

            profiles
                .update_all(&rotator, "deploy", &["empty", "default"])
                .unwrap();

            let reloaded = Profiles::load(Some(&path)).unwrap();
            assert_eq!(
                reloaded.get("empty").unwrap().get("region"),
                Some("eu-west-1")
            );
            assert_eq!(
                reloaded.get("default").unwrap().get(ACCESS_KEY_ID),
                Some("NEW-deploy")
            );
        }
    }
}
