//! Test fixtures for common test scenarios.
//!
//! Engine trees on disk, and local git repositories standing in for
//! upstream dependency projects.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, RepositoryInitOptions, Signature};

/// Fixture for an engine source tree.
#[derive(Debug, Clone, Default)]
pub struct EngineFixture {
    /// `motive.toml` content; not written when empty.
    pub config: String,
    /// Files relative to the root -> content.
    pub files: BTreeMap<PathBuf, String>,
}

impl EngineFixture {
    /// An engine with two entry points and two library units.
    pub fn standard() -> Self {
        EngineFixture::default()
            .with_file("motive3d.cpp", sources::entry_point("motive3d"))
            .with_file("motive2d.cpp", sources::entry_point("motive2d"))
            .with_file("engine.cpp", sources::library_unit("engine"))
            .with_file("video.cpp", sources::library_unit("video"))
    }

    /// Set the configuration file content.
    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }

    /// Add a file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Add a shader source under `shaders/`.
    pub fn with_shader(self, name: &str) -> Self {
        self.with_file(Path::new("shaders").join(name), sources::shader())
    }

    /// Write this fixture below `root`.
    pub fn write_to(&self, root: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(root)?;

        if !self.config.is_empty() {
            std::fs::write(root.join("motive.toml"), &self.config)?;
        }

        for (rel_path, content) in &self.files {
            let full_path = root.join(rel_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
        }

        Ok(())
    }
}

/// Initialize a non-bare repository whose initial branch is `main`.
pub fn init_repo(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(path, &opts).unwrap()
}

/// Write a file and commit it on HEAD. Returns the new commit.
pub fn commit_file(repo: &Repository, name: &str, contents: &str, message: &str) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    std::fs::write(workdir.join(name), contents).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now("Motive Tests", "tests@motive.invalid").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Common source file templates.
pub mod sources {
    /// A translation unit holding `main`.
    pub fn entry_point(name: &str) -> String {
        format!(
            r#"// {name} entry point

int engine_init();

int main() {{
    return engine_init();
}}
"#
        )
    }

    /// A runtime library member.
    pub fn library_unit(name: &str) -> String {
        format!(
            r#"// {name} runtime unit

int {name}_unit() {{
    return 0;
}}
"#
        )
    }

    /// A trivial GLSL shader.
    pub fn shader() -> String {
        r#"#version 450

void main() {
}
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_engine_fixture_write() {
        let tmp = TempDir::new().unwrap();
        EngineFixture::standard()
            .with_shader("mesh.vert")
            .with_config("[engine]\nname = \"engine\"\n")
            .write_to(tmp.path())
            .unwrap();

        assert!(tmp.path().join("motive.toml").exists());
        assert!(tmp.path().join("motive3d.cpp").exists());
        assert!(tmp.path().join("shaders/mesh.vert").exists());
    }

    #[test]
    fn test_commit_file_advances_head() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let first = commit_file(&repo, "a.txt", "1", "first");
        let second = commit_file(&repo, "a.txt", "2", "second");

        let head = repo.head().unwrap();
        assert_eq!(head.shorthand(), Some("main"));
        assert_eq!(head.target(), Some(second));
        assert_eq!(repo.find_commit(second).unwrap().parent_id(0).unwrap(), first);
    }
}
