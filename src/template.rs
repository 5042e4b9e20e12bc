//! Command materialization
//!
//! Expands the `${...}` placeholders of a rule's command template against a
//! [`SaveContext`]. Placeholders are disjoint literal tokens replaced
//! globally; there is no recursive expansion, so substituted values are
//! never re-scanned for further placeholders. The open-ended `${env.NAME}`
//! form is resolved last with a single regex pass capturing `NAME`.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::context::SaveContext;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{env\.([^}]+)\}").expect("env placeholder pattern is valid"));

/// Placeholders that require a workspace folder to resolve.
const WORKSPACE_PLACEHOLDERS: [&str; 3] =
    ["${relativeFile}", "${workspaceFolder}", "${workspaceRoot}"];

/// Errors raised while materializing a single rule
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template references {placeholder} but the saved file is not inside any workspace folder")]
    NoWorkspaceContext { placeholder: &'static str },
}

/// A command line ready for dispatch, with its surfacing preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedCommand {
    pub text: String,
    pub silent: bool,
}

/// Expand all placeholders in `template` using `ctx`.
///
/// Unset environment variables referenced via `${env.NAME}` substitute to
/// empty text; that is not an error.
///
/// # Errors
///
/// Returns `TemplateError::NoWorkspaceContext` when the template references
/// a workspace-scoped placeholder and `ctx` has no workspace.
pub fn materialize(template: &str, ctx: &SaveContext) -> Result<String, TemplateError> {
    let mut out = template.to_string();

    match &ctx.workspace {
        Some(ws) => {
            out = out.replace("${relativeFile}", &ws.relative_file);
            out = out.replace("${workspaceFolder}", &ws.root);
            out = out.replace("${workspaceRoot}", &ws.root);
        }
        None => {
            if let Some(placeholder) = WORKSPACE_PLACEHOLDERS
                .into_iter()
                .find(|p| out.contains(p))
            {
                return Err(TemplateError::NoWorkspaceContext { placeholder });
            }
        }
    }

    out = out.replace("${file}", &ctx.file);
    out = out.replace("${fileBasename}", &ctx.file_basename);
    out = out.replace("${fileBasenameNoExt}", &ctx.file_basename_no_ext);
    out = out.replace("${fileDirname}", &ctx.file_dirname);
    out = out.replace("${fileExtname}", &ctx.file_extname);
    out = out.replace("${cwd}", &ctx.cwd);

    // ${env.NAME} last: its pattern is open-ended, unset variables become ""
    let out = ENV_PLACEHOLDER.replace_all(&out, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    });

    Ok(out.into_owned())
}
