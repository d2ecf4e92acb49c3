// src/pipeline/bundler/module.rs

//! Per-module work: ES syntax rewriting, `require` scanning and resolution.
//!
//! Rewrites are line-preserving: every source line maps to exactly one
//! compiled line, and named exports are appended after the last line.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::fs::FileSystem;
use crate::pipeline::script::mask_non_code;

// Runs over `script::mask_non_code` output, where string contents are
// blanked to spaces.
static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\(\s*['"]( +)['"]\s*\)"#).expect("valid regex")
});
static IMPORT_NAMESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*)import\s+\*\s+as\s+([\w$]+)\s+from\s+['"]([^'"]+)['"]\s*;?\s*$"#)
        .expect("valid regex")
});
static IMPORT_NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*)import\s*\{([^}]*)\}\s*from\s+['"]([^'"]+)['"]\s*;?\s*$"#)
        .expect("valid regex")
});
static IMPORT_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*)import\s+([\w$]+)\s+from\s+['"]([^'"]+)['"]\s*;?\s*$"#)
        .expect("valid regex")
});
static IMPORT_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*)import\s+['"]([^'"]+)['"]\s*;?\s*$"#).expect("valid regex")
});
static EXPORT_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)export\s+default\s+").expect("valid regex"));
static EXPORT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)export\s+((?:async\s+)?function\*?|class|const|let|var)\s+([\w$]+)")
        .expect("valid regex")
});

/// Rewrite `import` / `export` statements into CommonJS.
pub fn compile(source: &str) -> String {
    let mut lines = Vec::new();
    let mut exported = Vec::new();

    for line in source.lines() {
        let rewritten = if let Some(c) = IMPORT_NAMESPACE.captures(line) {
            format!("{}var {} = require(\"{}\");", &c[1], &c[2], &c[3])
        } else if let Some(c) = IMPORT_NAMED.captures(line) {
            format!("{}var {{ {} }} = require(\"{}\");", &c[1], named_bindings(&c[2]), &c[3])
        } else if let Some(c) = IMPORT_DEFAULT.captures(line) {
            format!("{}var {} = require(\"{}\");", &c[1], &c[2], &c[3])
        } else if let Some(c) = IMPORT_BARE.captures(line) {
            format!("{}require(\"{}\");", &c[1], &c[2])
        } else if EXPORT_DEFAULT.is_match(line) {
            EXPORT_DEFAULT
                .replace(line, |c: &Captures| format!("{}module.exports = ", &c[1]))
                .into_owned()
        } else if let Some(c) = EXPORT_DECL.captures(line) {
            exported.push(c[3].to_string());
            EXPORT_DECL
                .replace(line, |c: &Captures| format!("{}{} {}", &c[1], &c[2], &c[3]))
                .into_owned()
        } else {
            line.to_string()
        };
        lines.push(rewritten);
    }

    for name in exported {
        lines.push(format!("module.exports.{name} = {name};"));
    }

    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn named_bindings(list: &str) -> String {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once(" as ") {
            Some((name, alias)) => format!("{}: {}", name.trim(), alias.trim()),
            None => item.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Specifiers of every `require("...")` call, in order of first appearance.
///
/// Calls inside comments, string literals and regex literals are not
/// counted.
pub fn requires(compiled: &str) -> Vec<String> {
    let masked = mask_non_code(compiled);
    let mut out: Vec<String> = Vec::new();
    for c in REQUIRE.captures_iter(&masked) {
        let Some(range) = c.get(1).map(|m| m.range()) else {
            continue;
        };
        let spec = &compiled[range];
        if !out.iter().any(|s| s == spec) {
            out.push(spec.to_string());
        }
    }
    out
}

/// Canonical id of a source-root-relative path: `/`-separated with `.` and
/// `..` folded, so `./app.js` and `app.js` name the same module.
pub fn module_id(path: &str) -> Option<String> {
    normalize("", &path.replace('\\', "/"))
}

/// Resolve `specifier` as required from module `from` to a module id (a
/// `/`-separated path relative to the source root).
///
/// Relative specifiers try the exact path, then `.js`, then `/index.js`.
/// Bare specifiers are looked up under `node_modules`.
pub fn resolve(fs: &dyn FileSystem, source_root: &Path, from: &str, specifier: &str) -> Option<String> {
    let base = if specifier.starts_with("./") || specifier.starts_with("../") {
        let dir = from.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        normalize(dir, specifier)?
    } else if let Some(absolute) = specifier.strip_prefix('/') {
        normalize("", absolute)?
    } else {
        normalize("node_modules", specifier)?
    };

    [
        base.clone(),
        format!("{base}.js"),
        format!("{base}/index.js"),
    ]
    .into_iter()
    .find(|candidate| fs.is_file(&source_root.join(candidate)))
}

/// Join `rel` onto `dir`, folding `.` and `..`. `None` when the result
/// would climb above the source root.
fn normalize(dir: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    for part in rel.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    #[test]
    fn es_imports_become_requires_on_the_same_line() {
        let src = "import * as ns from './a';\nimport { x, y as z } from \"./b\";\nimport d from './c';\nimport './d';\nconsole.log(x);";
        let out = compile(src);
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines[0], "var ns = require(\"./a\");");
        assert_eq!(lines[1], "var { x, y: z } = require(\"./b\");");
        assert_eq!(lines[2], "var d = require(\"./c\");");
        assert_eq!(lines[3], "require(\"./d\");");
        assert_eq!(lines[4], "console.log(x);");
        assert_eq!(requires(&out), vec!["./a", "./b", "./c", "./d"]);
    }

    #[test]
    fn exports_are_rewritten_and_appended() {
        let src = "export function add(a, b) { return a + b; }\nexport const PI = 3;\nexport default add;";
        let out = compile(src);
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines[0], "function add(a, b) { return a + b; }");
        assert_eq!(lines[1], "const PI = 3;");
        assert_eq!(lines[2], "module.exports = add;");
        assert_eq!(lines[3], "module.exports.add = add;");
        assert_eq!(lines[4], "module.exports.PI = PI;");
    }

    #[test]
    fn require_scan_deduplicates() {
        let src = "var a = require('./a');\nvar b = require( \"./a\" );\nrequire('lodash');";
        assert_eq!(requires(src), vec!["./a", "lodash"]);
    }

    #[test]
    fn commented_and_quoted_requires_are_ignored() {
        let src = "// var legacy = require('./legacy');\n/* require('./old') */\nvar s = \"require('./text')\";\nvar a = require('./a');\n";
        assert_eq!(requires(&compile(src)), vec!["./a"]);
    }

    #[test]
    fn module_ids_are_canonical() {
        assert_eq!(module_id("./app.js").as_deref(), Some("app.js"));
        assert_eq!(module_id("lib/./x/../util.js").as_deref(), Some("lib/util.js"));
        assert_eq!(module_id("lib\\util.js").as_deref(), Some("lib/util.js"));
        assert_eq!(module_id("../outside.js"), None);
    }

    #[test]
    fn relative_specifier_from_dotted_importer() {
        let fs = MemoryFileSystem::new();
        fs.add_file("src/util.js", "");
        let resolved = resolve(&fs, Path::new("src"), "./app.js", "./util");
        assert_eq!(resolved.as_deref(), Some("util.js"));
    }

    #[test]
    fn resolution_order() {
        let fs = MemoryFileSystem::new();
        fs.add_file("src/lib/util.js", "");
        fs.add_file("src/lib/widgets/index.js", "");
        fs.add_file("src/node_modules/dep/index.js", "");
        let root = Path::new("src");

        assert_eq!(resolve(&fs, root, "app.js", "./lib/util").as_deref(), Some("lib/util.js"));
        assert_eq!(resolve(&fs, root, "lib/util.js", "./widgets").as_deref(), Some("lib/widgets/index.js"));
        assert_eq!(resolve(&fs, root, "lib/widgets/index.js", "../util.js").as_deref(), Some("lib/util.js"));
        assert_eq!(resolve(&fs, root, "app.js", "dep").as_deref(), Some("node_modules/dep/index.js"));
        assert_eq!(resolve(&fs, root, "app.js", "./missing"), None);
        assert_eq!(resolve(&fs, root, "app.js", "../../escape"), None);
    }
}
