use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use accel_plugin::plugin::{PluginDefinition, PluginRole};

use crate::error::{Result, SimulatorError};

/// Callback that starts a managed plugin by itself, given the simulator
/// connection address as its sole argument.
pub type SpawnFn = dyn FnMut(&str) + Send;

/// Normalized launch contract for one plugin slot. The accepted
/// declaration shapes all collapse into one of these four variants at
/// configuration time; there is no late shape inspection anywhere else.
#[derive(Clone)]
pub enum PluginSpecification {
    /// CLI-style spec string: an executable name/path, or a script whose
    /// extension selects an interpreter plugin. Desugared by [`resolve`]
    /// at launch time, not here.
    ///
    /// [`resolve`]: PluginSpecification::resolve
    Spec(String),
    /// Explicit executable (and optional script) paths; no desugaring is
    /// performed.
    Process {
        executable: PathBuf,
        script: Option<PathBuf>,
    },
    /// In-process managed-thread plugin, driven by a behavior definition.
    /// The definition is shared so the same configuration can launch any
    /// number of consecutive simulations.
    Managed(Arc<Mutex<dyn PluginDefinition>>),
    /// In-process managed-thread plugin started by a user callback.
    Spawn(Arc<Mutex<SpawnFn>>),
}

impl fmt::Debug for PluginSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSpecification::Spec(text) => f.debug_tuple("Spec").field(text).finish(),
            PluginSpecification::Process { executable, script } => f
                .debug_struct("Process")
                .field("executable", executable)
                .field("script", script)
                .finish(),
            PluginSpecification::Managed(_) => f.write_str("Managed(..)"),
            PluginSpecification::Spawn(_) => f.write_str("Spawn(..)"),
        }
    }
}

impl From<&str> for PluginSpecification {
    fn from(text: &str) -> Self {
        PluginSpecification::Spec(text.to_string())
    }
}

impl From<String> for PluginSpecification {
    fn from(text: String) -> Self {
        PluginSpecification::Spec(text)
    }
}

impl<P: Into<PathBuf>> From<(P, Option<P>)> for PluginSpecification {
    fn from((executable, script): (P, Option<P>)) -> Self {
        PluginSpecification::Process {
            executable: executable.into(),
            script: script.map(Into::into),
        }
    }
}

impl PluginSpecification {
    pub fn managed<D: PluginDefinition + 'static>(definition: D) -> Self {
        PluginSpecification::Managed(Arc::new(Mutex::new(definition)))
    }

    pub fn spawn<F: FnMut(&str) + Send + 'static>(callback: F) -> Self {
        PluginSpecification::Spawn(Arc::new(Mutex::new(callback)))
    }

    /// Whether this specification launches an external process.
    pub fn is_process(&self) -> bool {
        matches!(
            self,
            PluginSpecification::Spec(_) | PluginSpecification::Process { .. }
        )
    }

    /// Desugars a `Spec` string against the current directory followed by
    /// `$PATH`; every other variant passes through unchanged. Engines call
    /// this when launching the pipeline.
    pub fn resolve(&self, role: PluginRole) -> Result<PluginSpecification> {
        let mut search = vec![env::current_dir().map_err(anyhow::Error::from)?];
        if let Some(path) = env::var_os("PATH") {
            search.extend(env::split_paths(&path));
        }
        self.resolve_in(role, &search)
    }

    /// Same as [`resolve`], against an explicit search path.
    ///
    /// [`resolve`]: PluginSpecification::resolve
    pub fn resolve_in(&self, role: PluginRole, search: &[PathBuf]) -> Result<PluginSpecification> {
        match self {
            PluginSpecification::Spec(text) => resolve_spec(role, text, search),
            other => Ok(other.clone()),
        }
    }
}

fn resolve_spec(role: PluginRole, text: &str, search: &[PathBuf]) -> Result<PluginSpecification> {
    let path = Path::new(text);
    if path.is_file() {
        // An existing file with an extension is a script; the extension
        // names the interpreter plugin and the script rides along as its
        // sole argument.
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let interpreter = format!("{}{}", role.executable_prefix(), ext);
            let executable = find_executable(&interpreter, search).ok_or_else(|| {
                SimulatorError::InvalidArgument(format!(
                    "no interpreter plugin {interpreter:?} found for script {text:?}"
                ))
            })?;
            return Ok(PluginSpecification::Process {
                executable,
                script: Some(path.to_path_buf()),
            });
        }
        return Ok(PluginSpecification::Process {
            executable: path.to_path_buf(),
            script: None,
        });
    }
    if text.contains(std::path::MAIN_SEPARATOR) {
        return Err(SimulatorError::InvalidArgument(format!(
            "plugin executable {text:?} does not exist"
        )));
    }
    // Bare names carry the role-specific prefix implicitly.
    let name = format!("{}{}", role.executable_prefix(), text);
    find_executable(&name, search)
        .map(|executable| PluginSpecification::Process {
            executable,
            script: None,
        })
        .ok_or_else(|| {
            SimulatorError::InvalidArgument(format!(
                "plugin executable {name:?} not found in search path"
            ))
        })
}

fn find_executable(name: &str, search: &[PathBuf]) -> Option<PathBuf> {
    search.iter().map(|dir| dir.join(name)).find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use accel_plugin::plugin::PluginMetadata;
    use tempfile::TempDir;

    use super::*;

    struct NullFrontend;

    impl PluginDefinition for NullFrontend {
        fn role(&self) -> PluginRole {
            PluginRole::Frontend
        }
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("null", "tests", "0.0.1")
        }
    }

    #[test]
    fn shapes_map_to_variants() {
        assert!(matches!(
            PluginSpecification::from("qx"),
            PluginSpecification::Spec(_)
        ));
        assert!(matches!(
            PluginSpecification::from(("bin/front", None)),
            PluginSpecification::Process { script: None, .. }
        ));
        assert!(matches!(
            PluginSpecification::from(("python3", Some("algo.py"))),
            PluginSpecification::Process { script: Some(_), .. }
        ));
        assert!(matches!(
            PluginSpecification::managed(NullFrontend),
            PluginSpecification::Managed(_)
        ));
        assert!(matches!(
            PluginSpecification::spawn(|_addr| {}),
            PluginSpecification::Spawn(_)
        ));
    }

    #[test]
    fn bare_name_gets_role_prefix() {
        let bin = TempDir::new().unwrap();
        File::create(bin.path().join("qpipefenull")).unwrap();

        let spec = PluginSpecification::from("null");
        let resolved = spec
            .resolve_in(PluginRole::Frontend, &[bin.path().to_path_buf()])
            .unwrap();
        match resolved {
            PluginSpecification::Process { executable, script } => {
                assert_eq!(executable, bin.path().join("qpipefenull"));
                assert!(script.is_none());
            }
            other => panic!("unexpected resolution: {other:?}"),
        }

        // The same name resolves differently per role.
        assert!(
            spec.resolve_in(PluginRole::Backend, &[bin.path().to_path_buf()])
                .is_err()
        );
    }

    #[test]
    fn script_extension_selects_interpreter() {
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        File::create(bin.path().join("qpipefepy")).unwrap();
        let script = work.path().join("algo.py");
        File::create(&script).unwrap();

        let spec = PluginSpecification::Spec(script.to_string_lossy().into_owned());
        let resolved = spec
            .resolve_in(PluginRole::Frontend, &[bin.path().to_path_buf()])
            .unwrap();
        match resolved {
            PluginSpecification::Process { executable, script: s } => {
                assert_eq!(executable, bin.path().join("qpipefepy"));
                assert_eq!(s, Some(script));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn extensionless_file_is_the_executable() {
        let work = TempDir::new().unwrap();
        let exe = work.path().join("frontend");
        File::create(&exe).unwrap();

        let spec = PluginSpecification::Spec(exe.to_string_lossy().into_owned());
        let resolved = spec.resolve_in(PluginRole::Frontend, &[]).unwrap();
        assert!(matches!(
            resolved,
            PluginSpecification::Process { executable, script: None } if executable == exe
        ));
    }

    #[test]
    fn missing_executables_are_invalid_arguments() {
        let spec = PluginSpecification::from("does/not/exist");
        assert!(matches!(
            spec.resolve_in(PluginRole::Frontend, &[]),
            Err(SimulatorError::InvalidArgument(_))
        ));

        let spec = PluginSpecification::from("ghost");
        assert!(matches!(
            spec.resolve_in(PluginRole::Operator, &[]),
            Err(SimulatorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn non_spec_variants_pass_through() {
        let spec = PluginSpecification::from(("bin/back", None));
        let resolved = spec.resolve_in(PluginRole::Backend, &[]).unwrap();
        assert!(matches!(resolved, PluginSpecification::Process { .. }));
    }
}
