#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use lantern::fs::DocumentRoot;
use lantern::http::handler::RequestHandler;
use tempfile::TempDir;

pub const HELLO: &[u8] = b"Hello, world!\n";
pub const DOCS_INDEX: &[u8] = b"<h1>docs</h1>\n";
pub const SECRET: &[u8] = b"top secret\n";

/// A document root inside a temp dir, with files placed next to it that
/// must never be served:
///
/// ```text
/// tmp/
///   secret.txt
///   www-backup/secret.txt
///   www/                  <- document root
///     hello.txt
///     with space.txt
///     data.unknownext
///     docs/index.html
///     files/a.txt
///     files/b.bin
///     files/nested/
/// ```
pub struct Site {
    pub tmp: TempDir,
    pub root: DocumentRoot,
}

impl Site {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let www = tmp.path().join("www");

        fs::create_dir_all(www.join("docs")).unwrap();
        fs::create_dir_all(www.join("files/nested")).unwrap();
        fs::create_dir_all(tmp.path().join("www-backup")).unwrap();

        fs::write(www.join("hello.txt"), HELLO).unwrap();
        fs::write(www.join("with space.txt"), b"spaced").unwrap();
        fs::write(www.join("data.unknownext"), b"\x00\x01").unwrap();
        fs::write(www.join("docs/index.html"), DOCS_INDEX).unwrap();
        fs::write(www.join("files/a.txt"), b"a").unwrap();
        fs::write(www.join("files/b.bin"), b"b").unwrap();
        fs::write(tmp.path().join("secret.txt"), SECRET).unwrap();
        fs::write(tmp.path().join("www-backup/secret.txt"), SECRET).unwrap();

        let root = DocumentRoot::open(&www).unwrap();
        Self { tmp, root }
    }

    pub fn www(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn handler(&self) -> Arc<RequestHandler> {
        Arc::new(RequestHandler::new(self.root.clone()))
    }
}
