//! Build-file instructions and their text form.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    From {
        image: String,
        alias: Option<String>,
    },
    Copy {
        src: String,
        dest: String,
    },
    Env {
        key: String,
        value: String,
    },
    Run(String),
    /// Runs `then` when `path` is a regular file in the image, `otherwise` if not.
    RunIfExists {
        path: String,
        then: String,
        otherwise: String,
    },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::From { image, alias: None } => write!(f, "FROM {image}"),
            Instruction::From {
                image,
                alias: Some(alias),
            } => write!(f, "FROM {image} AS {alias}"),
            Instruction::Copy { src, dest } => write!(f, "COPY {src} {dest}"),
            Instruction::Env { key, value } => write!(f, "ENV {key}={value}"),
            Instruction::Run(command) => write!(f, "RUN {command}"),
            Instruction::RunIfExists {
                path,
                then,
                otherwise,
            } => write!(
                f,
                "RUN if [ -f {path} ] ;\\\n    then {then} ;\\\n    else {otherwise} ;\\\n    fi"
            ),
        }
    }
}

/// An ordered list of instructions, rendered one per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFile {
    instructions: Vec<Instruction>,
}

impl BuildFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for instruction in &self.instructions {
            out.push_str(&instruction.to_string());
            out.push('\n');
        }
        out
    }
}

impl FromIterator<Instruction> for BuildFile {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_each_instruction_kind() {
        let file: BuildFile = [
            Instruction::From {
                image: "python:3.11".to_string(),
                alias: Some("base".to_string()),
            },
            Instruction::Copy {
                src: "mymodel".to_string(),
                dest: "/model/mymodel".to_string(),
            },
            Instruction::Env {
                key: "PYTHONPATH".to_string(),
                value: "/framework:/model".to_string(),
            },
            Instruction::Run("make -f /framework/Makefile".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            file.render(),
            "FROM python:3.11 AS base\n\
             COPY mymodel /model/mymodel\n\
             ENV PYTHONPATH=/framework:/model\n\
             RUN make -f /framework/Makefile\n"
        );
    }

    #[test]
    fn conditional_run_falls_back_to_notice() {
        let run = Instruction::RunIfExists {
            path: "/model/m/requirements.txt".to_string(),
            then: "pip install -r /model/m/requirements.txt".to_string(),
            otherwise: "echo no /model/m/requirements.txt found".to_string(),
        };
        let text = run.to_string();
        assert!(text.starts_with("RUN if [ -f /model/m/requirements.txt ] ;"));
        assert!(text.contains("then pip install -r /model/m/requirements.txt ;"));
        assert!(text.contains("else echo no /model/m/requirements.txt found ;"));
        assert!(text.ends_with("fi"));
    }

    #[test]
    fn push_preserves_order() {
        let mut file = BuildFile::new();
        file.push(Instruction::Run("a".to_string()))
            .push(Instruction::Run("b".to_string()));
        assert_eq!(file.render(), "RUN a\nRUN b\n");
        assert_eq!(file.instructions().len(), 2);
    }
}
