//! PlantUML invocation

use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{BuildError, Result};

/// Runs the PlantUML jar through a Java launcher, one source at a time.
#[derive(Debug, Clone)]
pub struct Renderer {
    /// Java launcher (`java` or an absolute path)
    pub java: String,
    /// Absolute path to the jar; the child runs in another directory
    pub jar: PathBuf,
    pub format: String,
    /// Directory holding the sources, used as the child's working directory
    pub input_dir: PathBuf,
    /// Output directory, relative to `input_dir`
    pub relative_output: PathBuf,
}

impl Renderer {
    pub fn new(
        java: &str,
        jar: &Path,
        format: &str,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Self {
        Self {
            java: java.to_string(),
            jar: jar.to_path_buf(),
            format: format.to_string(),
            input_dir: input_dir.to_path_buf(),
            relative_output: relative_path(input_dir, output_dir),
        }
    }

    pub fn args(&self, source: &str) -> Vec<String> {
        vec![
            "-jar".to_string(),
            self.jar.display().to_string(),
            format!("-t{}", self.format),
            "-o".to_string(),
            self.relative_output.display().to_string(),
            source.to_string(),
        ]
    }

    /// Render one file, blocking until the child exits.
    ///
    /// Standard streams are inherited so PlantUML output shows up live.
    pub fn render(&self, source: &str) -> Result<()> {
        let args = self.args(source);
        tracing::debug!("Running {} {}", self.java, args.join(" "));

        let status = Command::new(&self.java)
            .args(&args)
            .current_dir(&self.input_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| BuildError::Spawn {
                program: self.java.clone(),
                source,
            })?;

        if !status.success() {
            return Err(BuildError::Render {
                file: source.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }

    /// Render every source in order, stopping at the first failure.
    pub fn render_all<F>(&self, sources: &[String], mut on_start: F) -> Result<Vec<String>>
    where
        F: FnMut(&str),
    {
        let mut rendered = Vec::with_capacity(sources.len());
        for source in sources {
            on_start(source);
            self.render(source)?;
            rendered.push(source.clone());
        }
        Ok(rendered)
    }
}

/// Path of `to` as seen from `from`; `.` when they are the same directory.
///
/// Both paths are normalized lexically first, so `..` segments are resolved
/// without touching the filesystem. Both should be absolute or both relative
/// to the same base.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize(from);
    let to = normalize(to);

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..from.len() {
        result.push("..");
    }
    for component in &to[common..] {
        result.push(component.as_os_str());
    }

    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Drop `.` and fold `..` into the preceding segment.
///
/// `..` directly under the root stays at the root; leading `..` on a relative
/// path is kept.
fn normalize(path: &Path) -> Vec<Component<'_>> {
    let mut components: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }
    components
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_default_layout() {
        assert_eq!(
            relative_path(Path::new("/p/diagrams/src"), Path::new("/p/src/assets")),
            PathBuf::from("../../src/assets")
        );
    }

    #[test]
    fn test_relative_path_same_dir() {
        assert_eq!(relative_path(Path::new("/p/a"), Path::new("/p/a")), PathBuf::from("."));
        assert_eq!(relative_path(Path::new("/p/a/."), Path::new("/p/a")), PathBuf::from("."));
    }

    #[test]
    fn test_relative_path_nested() {
        assert_eq!(
            relative_path(Path::new("/p/diagrams"), Path::new("/p/diagrams/out/svg")),
            PathBuf::from("out/svg")
        );
        assert_eq!(
            relative_path(Path::new("/p/diagrams/src/deep"), Path::new("/p/diagrams")),
            PathBuf::from("../..")
        );
    }

    #[test]
    fn test_relative_path_resolves_parent_segments() {
        assert_eq!(
            relative_path(Path::new("/p/../shared/diagrams"), Path::new("/p/src/assets")),
            PathBuf::from("../../p/src/assets")
        );
        assert_eq!(
            relative_path(
                Path::new("/p/diagrams/src"),
                Path::new("/p/diagrams/src/../../out")
            ),
            PathBuf::from("../../out")
        );
        assert_eq!(
            relative_path(Path::new("/p/x/../a"), Path::new("/p/a")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_normalize_clamps_at_root() {
        assert_eq!(
            normalize(Path::new("/../a/./b/..")),
            vec![Component::RootDir, Component::Normal("a".as_ref())]
        );
        assert_eq!(
            normalize(Path::new("../a/../../b")),
            vec![Component::ParentDir, Component::ParentDir, Component::Normal("b".as_ref())]
        );
    }

    #[test]
    fn test_args() {
        let renderer = Renderer::new(
            "java",
            Path::new("/p/tools/plantuml.jar"),
            "svg",
            Path::new("/p/diagrams/src"),
            Path::new("/p/src/assets"),
        );
        assert_eq!(
            renderer.args("a.puml"),
            vec!["-jar", "/p/tools/plantuml.jar", "-tsvg", "-o", "../../src/assets", "a.puml"]
        );
    }

    #[cfg(unix)]
    mod process {
        use super::super::fake_java;
        use super::*;
        use tempfile::TempDir;

        fn renderer(temp_dir: &TempDir, java: &Path) -> Renderer {
            let input = temp_dir.path().join("in");
            std::fs::create_dir_all(&input).unwrap();
            Renderer::new(
                &java.display().to_string(),
                &temp_dir.path().join("plantuml.jar"),
                "svg",
                &input,
                &temp_dir.path().join("out"),
            )
        }

        #[test]
        fn test_runs_in_input_dir() {
            let temp_dir = TempDir::new().unwrap();
            let log = temp_dir.path().join("calls.log");
            let java = fake_java::install(temp_dir.path(), &log, 0);
            let renderer = renderer(&temp_dir, &java);

            renderer.render("a.puml").unwrap();

            let calls = fake_java::calls(&log);
            assert_eq!(calls.len(), 1);
            let (cwd, args) = calls[0].split_once('|').unwrap();
            assert_eq!(
                std::fs::canonicalize(cwd).unwrap(),
                std::fs::canonicalize(temp_dir.path().join("in")).unwrap()
            );
            assert!(args.ends_with("-tsvg -o ../out a.puml"));
        }

        #[test]
        fn test_stops_at_first_failure() {
            let temp_dir = TempDir::new().unwrap();
            let log = temp_dir.path().join("calls.log");
            let java = fake_java::install(temp_dir.path(), &log, 3);
            let renderer = renderer(&temp_dir, &java);

            let sources = vec!["a.puml".to_string(), "b.puml".to_string()];
            let mut started = Vec::new();
            let err = renderer
                .render_all(&sources, |s| started.push(s.to_string()))
                .unwrap_err();

            match err {
                BuildError::Render { file, code } => {
                    assert_eq!(file, "a.puml");
                    assert_eq!(code, Some(3));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(started, vec!["a.puml"]);
            assert_eq!(fake_java::calls(&log).len(), 1);
        }

        #[test]
        fn test_missing_launcher() {
            let temp_dir = TempDir::new().unwrap();
            let renderer = renderer(&temp_dir, &temp_dir.path().join("no-such-java"));

            let err = renderer.render("a.puml").unwrap_err();
            assert!(matches!(err, BuildError::Spawn { .. }));
        }
    }
}
