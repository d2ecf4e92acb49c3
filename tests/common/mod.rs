#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use assetflow::BuildSettings;
use assetflow::fs::MemoryFileSystem;

pub use assetflow_test_utils::{init_tracing, with_timeout};

pub const SOURCE_ROOT: &str = "site";
pub const OUTPUT_ROOT: &str = "site/public";

pub const TEMPLATE: &str = "<html>\n  <head>\n    <title>demo</title>\n  </head>\n  <body>\n    {% if debug %}<p>debug build</p>{% endif %}\n  </body>\n</html>\n";

/// A small project: template, two script modules, one stylesheet, one image.
pub fn sample_site() -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    fs.add_file("site/components/app.html", TEMPLATE);
    fs.add_file(
        "site/app.js",
        "// entry point\nvar util = require('./util');\n\nutil.greet('world');\n",
    );
    fs.add_file(
        "site/util.js",
        "/* helpers */\nexports.greet = function (name) {\n  return 'hello ' + name;\n};\n",
    );
    fs.add_file(
        "site/components/button/button.scss",
        "$pad: 4px;\n.button {\n  padding: $pad;\n  .label { color: red; }\n}\n",
    );
    fs.add_file("site/components/logo/logo.png", "png-bytes");
    fs
}

pub fn memory_settings(fs: &MemoryFileSystem) -> BuildSettings {
    BuildSettings::new(SOURCE_ROOT, OUTPUT_ROOT).with_fs(Arc::new(fs.clone()))
}

pub fn output(fs: &MemoryFileSystem, rel: impl AsRef<Path>) -> Option<String> {
    fs.contents(Path::new(OUTPUT_ROOT).join(rel))
}
