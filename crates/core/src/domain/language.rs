// Language Detection & Starter Code

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lower-cased extension of a file name ("" when there is none)
fn extension(file_name: &str) -> String {
    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Editor language for a file name (syntax highlighting, stored on file nodes)
pub fn editor_language(file_name: &str) -> String {
    let lang = match extension(file_name).as_str() {
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "java" => "java",
        "cpp" => "cpp",
        "c" => "c",
        "go" => "go",
        "sh" => "bash",
        "html" => "html",
        "css" => "css",
        "json" => "json",
        _ => "text",
    };
    lang.to_string()
}

/// Project-level language (the language a new project is created with)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectLanguage {
    Python,
    Java,
    #[default]
    Javascript,
    Cpp,
    C,
    Go,
    Bash,
}

impl ProjectLanguage {
    pub const ALL: [ProjectLanguage; 7] = [
        ProjectLanguage::Python,
        ProjectLanguage::Java,
        ProjectLanguage::Javascript,
        ProjectLanguage::Cpp,
        ProjectLanguage::C,
        ProjectLanguage::Go,
        ProjectLanguage::Bash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectLanguage::Python => "python",
            ProjectLanguage::Java => "java",
            ProjectLanguage::Javascript => "javascript",
            ProjectLanguage::Cpp => "cpp",
            ProjectLanguage::C => "c",
            ProjectLanguage::Go => "go",
            ProjectLanguage::Bash => "bash",
        }
    }

    /// Extension used for the default `main.<ext>` file
    pub fn extension(&self) -> &'static str {
        match self {
            ProjectLanguage::Python => "py",
            ProjectLanguage::Java => "java",
            ProjectLanguage::Javascript => "js",
            ProjectLanguage::Cpp => "cpp",
            ProjectLanguage::C => "c",
            ProjectLanguage::Go => "go",
            ProjectLanguage::Bash => "sh",
        }
    }

    pub fn starter_code(&self) -> &'static str {
        match self {
            ProjectLanguage::Python => "print(\"Hello World\")",
            ProjectLanguage::Java => {
                "public class Main { public static void main(String[] args) { System.out.println(\"Hello World\"); } }"
            }
            ProjectLanguage::Javascript => "console.log(\"Hello World\");",
            ProjectLanguage::Cpp => {
                "#include <iostream>\n\nint main() {\n    std::cout << \"Hello World\" << std::endl;\n    return 0;\n}"
            }
            ProjectLanguage::C => {
                "#include <stdio.h>\n\nint main() {\n    printf(\"Hello World\\n\");\n    return 0;\n}"
            }
            ProjectLanguage::Go => {
                "package main\n\nimport \"fmt\"\n\nfunc main() {\n    fmt.Println(\"Hello World\")\n}"
            }
            ProjectLanguage::Bash => "echo \"Hello World\"",
        }
    }
}

impl std::fmt::Display for ProjectLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectLanguage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ProjectLanguage::ALL
            .into_iter()
            .find(|lang| lang.as_str() == wanted)
            .ok_or_else(|| DomainError::UnsupportedLanguage(s.to_string()))
    }
}

/// Files that are rendered instead of executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Text,
    Html,
    Css,
    Pdf,
}

/// How a file from the tree gets "run"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    /// Sent to the execution API under `language` as `file_name`
    Execute { language: String, file_name: String },
    Preview(PreviewKind),
}

impl RunTarget {
    /// Detect the run target from a file name, `None` for unsupported types
    pub fn detect(file_name: &str) -> Option<RunTarget> {
        let execute = |language: &str, name: &str| RunTarget::Execute {
            language: language.to_string(),
            file_name: name.to_string(),
        };

        let target = match extension(file_name).as_str() {
            "py" => execute("python3", "main.py"),
            "js" => execute("javascript", "main.js"),
            "ts" => execute("typescript", "main.ts"),
            "c" => execute("c", "main.c"),
            "cpp" | "cc" | "cxx" => execute("cpp", "main.cpp"),
            "go" => execute("go", "main.go"),
            "sh" => execute("bash", "main.sh"),
            "java" => {
                // Java needs the file named after its public class
                let base = file_name.rsplit('/').next().unwrap_or(file_name);
                let class_name = base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base);
                execute("java", &format!("{}.java", class_name))
            }
            "html" | "htm" => RunTarget::Preview(PreviewKind::Html),
            "css" => RunTarget::Preview(PreviewKind::Css),
            "txt" | "md" | "json" | "yml" | "yaml" | "env" | "dotenv" => {
                RunTarget::Preview(PreviewKind::Text)
            }
            "pdf" => RunTarget::Preview(PreviewKind::Pdf),
            _ => return None,
        };
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_language() {
        assert_eq!(editor_language("main.py"), "python");
        assert_eq!(editor_language("App.JS"), "javascript");
        assert_eq!(editor_language("run.sh"), "bash");
        assert_eq!(editor_language("Makefile"), "text");
        assert_eq!(editor_language("notes.txt"), "text");
    }

    #[test]
    fn test_project_language_parse() {
        assert_eq!("Python".parse::<ProjectLanguage>(), Ok(ProjectLanguage::Python));
        assert_eq!(" cpp ".parse::<ProjectLanguage>(), Ok(ProjectLanguage::Cpp));
        assert!(matches!(
            "cobol".parse::<ProjectLanguage>(),
            Err(DomainError::UnsupportedLanguage(_))
        ));
        assert_eq!(ProjectLanguage::default(), ProjectLanguage::Javascript);
    }

    #[test]
    fn test_starter_code_matches_language() {
        assert!(ProjectLanguage::Python.starter_code().contains("print"));
        assert!(ProjectLanguage::Go.starter_code().starts_with("package main"));
        assert!(ProjectLanguage::C.starter_code().contains("printf"));
        assert_eq!(ProjectLanguage::Bash.extension(), "sh");
    }

    #[test]
    fn test_run_target_execute() {
        assert_eq!(
            RunTarget::detect("src/app.py"),
            Some(RunTarget::Execute {
                language: "python3".to_string(),
                file_name: "main.py".to_string()
            })
        );
        assert_eq!(
            RunTarget::detect("algo.cc"),
            Some(RunTarget::Execute {
                language: "cpp".to_string(),
                file_name: "main.cpp".to_string()
            })
        );
    }

    #[test]
    fn test_run_target_java_uses_class_name() {
        assert_eq!(
            RunTarget::detect("src/HelloWorld.java"),
            Some(RunTarget::Execute {
                language: "java".to_string(),
                file_name: "HelloWorld.java".to_string()
            })
        );
    }

    #[test]
    fn test_run_target_preview_and_unsupported() {
        assert_eq!(
            RunTarget::detect("index.HTM"),
            Some(RunTarget::Preview(PreviewKind::Html))
        );
        assert_eq!(
            RunTarget::detect("README.md"),
            Some(RunTarget::Preview(PreviewKind::Text))
        );
        assert_eq!(RunTarget::detect("photo.png"), None);
        assert_eq!(RunTarget::detect("Dockerfile"), None);
    }
}
