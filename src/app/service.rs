use crate::app::config::{parse_dump_config, Settings};
use crate::app::error::{Error, Result};
use crate::app::fetch::Fetcher;
use crate::app::filter::PathFilter;
use crate::app::formatter::OutputGenerator;
use crate::app::models::{
    CancelToken, Encoding, FileRecord, Report, Source, Timestamps, WriteIntent,
};
use crate::app::parser;
use crate::app::scanner::Scanner;
use crate::app::vault::{ensure_directory, Vault};
use std::time::SystemTime;

/// Result of a dump: the new document plus what happened to each item.
#[derive(Debug)]
pub struct Dump {
    pub document: String,
    pub report: Report,
}

/// Stateless service behind the template, dump and restore commands.
pub struct Screwdriver<'a> {
    vault: &'a dyn Vault,
    fetcher: &'a dyn Fetcher,
    settings: Settings,
}

impl<'a> Screwdriver<'a> {
    pub fn new(vault: &'a dyn Vault, fetcher: &'a dyn Fetcher, settings: Settings) -> Self {
        log::debug!("Screwdriver initialized with {:?}", settings);
        Self {
            vault,
            fetcher,
            settings,
        }
    }

    /// Builds a starter front matter listing every folder under `root`.
    ///
    /// Refuses to run on a document that already has content.
    pub fn create_template(&self, document: &str, root: &str) -> Result<String> {
        if !document.trim().is_empty() {
            return Err(Error::Config(
                "the note is not empty; the template is written into it".into(),
            ));
        }

        let filter = PathFilter::new(&self.settings.listing_ignores, &[]);
        let dirs = Scanner::new(self.vault, filter).list_directories(root)?;

        let mut out = String::from("---\n# --- Select a directory to dump. ---\n");
        for dir in &dirs {
            out.push_str(&format!("# target: {}\n", dir));
        }
        out.push_str("\n# --- Suffixes to ignore. ---\nignores:\n");
        for ignore in &self.settings.template_ignores {
            out.push_str(&format!("- {}\n", ignore));
        }
        out.push_str("\n# --- Regular expressions for filtering files\nfilters:\n# - \\.js\n");
        out.push_str("\n# --- Remote resources to embed\n# urls:\n# - https://example.com/file.txt\n");
        out.push_str("---\n\n");
        Ok(out)
    }

    /// Serializes every configured target and URL into a new document.
    pub fn dump(&self, document: &str, cancel: &CancelToken) -> Result<Dump> {
        let config = parse_dump_config(document)?;
        log::debug!(
            "Dumping {} targets and {} urls",
            config.targets().count(),
            config.urls().count()
        );
        let filter = PathFilter::new(&config.ignores, &config.filters);
        let mut blocks = Vec::new();
        let mut report = Report::default();

        for source in &config.sources {
            cancel.check()?;
            match source {
                Source::LocalDirectory(target) => {
                    let files = match Scanner::new(self.vault, filter).scan(target) {
                        Ok(files) => files,
                        Err(e) => {
                            report.failed(target.as_str(), e);
                            continue;
                        }
                    };
                    log::info!("📂 {}: {} files", target, files.len());
                    for file in files {
                        cancel.check()?;
                        match self.read_local(&file) {
                            Ok(record) => {
                                blocks.push(OutputGenerator::block(record));
                                report.done(file);
                            }
                            Err(e) => report.failed(file, e),
                        }
                    }
                }
                Source::RemoteUrl(url) => match self.fetcher.fetch(url) {
                    Ok(content) => {
                        blocks.push(OutputGenerator::block(FileRecord {
                            path: url.clone(),
                            content,
                            timestamps: Timestamps::Fetched(SystemTime::now()),
                        }));
                        report.done(url.as_str());
                    }
                    Err(reason) => report.failed(
                        url.as_str(),
                        Error::Fetch {
                            url: url.clone(),
                            reason,
                        },
                    ),
                },
            }
        }

        Ok(Dump {
            document: OutputGenerator::document(&config.header, &blocks),
            report,
        })
    }

    fn read_local(&self, path: &str) -> Result<FileRecord> {
        let stat = self.vault.stat(path).unwrap_or_else(|e| {
            log::debug!("No timestamps for {}: {}", path, e);
            Default::default()
        });
        let content = self.vault.read_binary(path).map_err(|e| Error::io(path, e))?;
        Ok(FileRecord {
            path: path.to_string(),
            content,
            timestamps: Timestamps::Local {
                created: stat.created,
                modified: stat.modified,
            },
        })
    }

    /// Writes every block of `document` back into the vault.
    ///
    /// A missing front matter aborts before anything is written; any other
    /// failure is reported for its block and the next block is attempted.
    pub fn restore(&self, document: &str, cancel: &CancelToken) -> Result<Report> {
        let blocks = parser::parse(document)?;
        let mut report = Report::default();

        for block in blocks {
            cancel.check()?;
            match block.and_then(|intent| self.write(&intent).map(|()| intent)) {
                Ok(intent) => report.done(intent.path),
                Err(e) => {
                    let item = match &e {
                        Error::Decode { path, .. }
                        | Error::DirectoryCreate { path, .. }
                        | Error::Io { path, .. } => path.clone(),
                        _ => "block".to_string(),
                    };
                    report.failed(item, e);
                }
            }
        }
        Ok(report)
    }

    fn write(&self, intent: &WriteIntent) -> Result<()> {
        log::debug!("Writing {} as {}", intent.path, intent.encoding);
        ensure_directory(self.vault, &intent.path)?;
        let written = match (intent.encoding, std::str::from_utf8(&intent.content)) {
            (Encoding::Plain, Ok(text)) => self.vault.write(&intent.path, text),
            _ => self.vault.write_binary(&intent.path, &intent.content),
        };
        written.map_err(|e| Error::io(intent.path.as_str(), e))
    }
}

impl Drop for Screwdriver<'_> {
    fn drop(&mut self) {
        log::debug!("Screwdriver shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::fetch::stub::StubFetcher;
    use crate::app::models::Notice;
    use crate::app::vault::memory::MemoryVault;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];

    fn source_vault() -> MemoryVault {
        MemoryVault::with_files(&[
            ("proj/readme.md", b"# Title\nUse `code` and C:\\path\\\n"),
            ("proj/src/main.ts", b"const s = `tpl ${x}`;\n```\nfenced\n```"),
            ("proj/src/empty.txt", b""),
            ("proj/assets/logo.png", PNG),
            ("proj/node_modules/dep/index.js", b"ignored"),
        ])
    }

    #[test]
    fn dump_then_restore_reproduces_files() {
        let source = source_vault();
        let fetcher = StubFetcher::default();
        let cancel = CancelToken::new();
        let note = "---\ntarget: proj\nignores:\n- /node_modules\n---\n";

        let dump = Screwdriver::new(&source, &fetcher, Settings::default())
            .dump(note, &cancel)
            .unwrap();
        assert_eq!(dump.report.succeeded().count(), 4);
        assert!(dump.document.starts_with(note));
        assert!(dump.document.contains("```screwdriver:proj/assets/logo.png:bin\n"));

        let target = MemoryVault::new();
        let report = Screwdriver::new(&target, &fetcher, Settings::default())
            .restore(&dump.document, &cancel)
            .unwrap();
        assert_eq!(report.failures().count(), 0);
        assert_eq!(target.file_count(), 4);
        for path in [
            "proj/readme.md",
            "proj/src/main.ts",
            "proj/src/empty.txt",
            "proj/assets/logo.png",
        ] {
            assert_eq!(target.file(path), source.file(path), "{}", path);
        }
        assert_eq!(target.file("proj/node_modules/dep/index.js"), None);
    }

    #[test]
    fn bare_carriage_returns_survive_a_round_trip() {
        let source = MemoryVault::with_files(&[
            ("p/mac.txt", b"line1\rline2\r"),
            ("p/crlf.txt", b"a\r\nb\r\n"),
        ]);
        let fetcher = StubFetcher::default();
        let dump = Screwdriver::new(&source, &fetcher, Settings::default())
            .dump("---\ntarget: p\n---\n", &CancelToken::new())
            .unwrap();

        let target = MemoryVault::new();
        Screwdriver::new(&target, &fetcher, Settings::default())
            .restore(&dump.document, &CancelToken::new())
            .unwrap();
        assert_eq!(target.file("p/mac.txt"), Some(b"line1\rline2\r".to_vec()));
        assert_eq!(target.file("p/crlf.txt"), Some(b"a\r\nb\r\n".to_vec()));
    }

    #[test]
    fn dump_orders_blocks_by_walk() {
        let source = source_vault();
        let fetcher = StubFetcher::default();
        let note = "---\ntarget: proj\nignores: /node_modules\n---\n";
        let dump = Screwdriver::new(&source, &fetcher, Settings::default())
            .dump(note, &CancelToken::new())
            .unwrap();
        let order: Vec<_> = dump.report.succeeded().collect();
        assert_eq!(
            order,
            vec![
                "proj/readme.md",
                "proj/assets/logo.png",
                "proj/src/empty.txt",
                "proj/src/main.ts"
            ]
        );
    }

    #[test]
    fn empty_configuration_is_rejected() {
        let vault = MemoryVault::new();
        let fetcher = StubFetcher::default();
        let err = Screwdriver::new(&vault, &fetcher, Settings::default())
            .dump("---\ntargets: []\nurls: []\n---\n", &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn fetch_failures_do_not_stop_the_batch() {
        let vault = MemoryVault::with_files(&[("docs/a.txt", b"local")]);
        let fetcher = StubFetcher::default().with("https://ok.example/r.txt", b"remote");
        let note = "---\ntarget: docs\nurls:\n- https://down.example/x\n- https://ok.example/r.txt\n---\n";
        let dump = Screwdriver::new(&vault, &fetcher, Settings::default())
            .dump(note, &CancelToken::new())
            .unwrap();

        let failures: Vec<_> = dump.report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].1, Error::Fetch { url, .. } if url == "https://down.example/x"));
        assert!(dump.document.contains("```screwdriver:docs/a.txt:plain\nlocal\n```"));
        assert!(dump
            .document
            .contains("```screwdriver:https://ok.example/r.txt:plain\nremote\n```"));
        assert!(dump.document.contains("- Fetched :"));

        let target = MemoryVault::new();
        Screwdriver::new(&target, &fetcher, Settings::default())
            .restore(&dump.document, &CancelToken::new())
            .unwrap();
        assert_eq!(target.file("ok.example/r.txt"), Some(b"remote".to_vec()));
    }

    #[test]
    fn missing_target_is_reported_not_fatal() {
        let vault = MemoryVault::with_files(&[("real/a.txt", b"a")]);
        let fetcher = StubFetcher::default();
        let note = "---\ntargets: [ghost, real]\n---\n";
        let dump = Screwdriver::new(&vault, &fetcher, Settings::default())
            .dump(note, &CancelToken::new())
            .unwrap();
        assert_eq!(dump.report.failures().count(), 1);
        assert_eq!(dump.report.succeeded().collect::<Vec<_>>(), vec!["real/a.txt"]);
    }

    #[test]
    fn malformed_block_is_isolated() {
        let doc = "---\ntarget: x\n---\n\n\
                   ```screwdriver:x/one.txt:plain\none\n```\n\
                   ```screwdriver:x/broken.bin:bin\n@@not base64@@\n```\n\
                   ```screwdriver:x/two.bin:bin\nAAEC\n```";
        let vault = MemoryVault::new();
        let fetcher = StubFetcher::default();
        let report = Screwdriver::new(&vault, &fetcher, Settings::default())
            .restore(doc, &CancelToken::new())
            .unwrap();

        let failed: Vec<_> = report.failures().map(|(item, _)| item).collect();
        assert_eq!(failed, vec!["x/broken.bin"]);
        assert_eq!(vault.file("x/one.txt"), Some(b"one".to_vec()));
        assert_eq!(vault.file("x/two.bin"), Some(vec![0, 1, 2]));
        assert_eq!(vault.file("x/broken.bin"), None);
    }

    #[test]
    fn folder_failure_skips_only_that_file() {
        let doc = "---\n---\n\
                   ```screwdriver:locked/a.txt:plain\na\n```\n\
                   ```screwdriver:open/b.txt:plain\nb\n```";
        let vault = MemoryVault::new().break_folder("locked");
        let fetcher = StubFetcher::default();
        let report = Screwdriver::new(&vault, &fetcher, Settings::default())
            .restore(doc, &CancelToken::new())
            .unwrap();

        assert!(matches!(
            &report.notices[0],
            Notice::Failed { error: Error::DirectoryCreate { .. }, .. }
        ));
        assert_eq!(vault.file("open/b.txt"), Some(b"b".to_vec()));
    }

    #[test]
    fn restore_without_front_matter_writes_nothing() {
        let vault = MemoryVault::new();
        let fetcher = StubFetcher::default();
        let err = Screwdriver::new(&vault, &fetcher, Settings::default())
            .restore("```screwdriver:a.txt:plain\na\n```", &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::MissingFrontMatter));
        assert_eq!(vault.file_count(), 0);
    }

    #[test]
    fn cancelled_operations_stop_early() {
        let vault = source_vault();
        let fetcher = StubFetcher::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let service = Screwdriver::new(&vault, &fetcher, Settings::default());
        assert!(matches!(
            service.dump("---\ntarget: proj\n---\n", &cancel),
            Err(Error::Cancelled)
        ));
        assert!(matches!(
            service.restore("---\n---\n```screwdriver:z.txt:plain\nz\n```", &cancel),
            Err(Error::Cancelled)
        ));
        assert_eq!(vault.file("z.txt"), None);
    }

    #[test]
    fn template_lists_folders_and_feeds_a_dump() {
        let vault = source_vault();
        vault.add_folder(".git");
        let fetcher = StubFetcher::default();
        let service = Screwdriver::new(&vault, &fetcher, Settings::default());

        let template = service.create_template("  \n", "").unwrap();
        assert!(template.contains("# target: proj\n"));
        assert!(template.contains("# target: proj/src\n"));
        assert!(!template.contains("# target: .git"));
        assert!(!template.contains("# target: proj/node_modules"));
        assert!(template.contains("ignores:\n- /node_modules\n- /.git\n"));

        let note = template.replace("# target: proj/src\n", "target: proj/src\n");
        let dump = service.dump(&note, &CancelToken::new()).unwrap();
        assert_eq!(dump.report.succeeded().count(), 2);

        assert!(matches!(
            service.create_template("already here", ""),
            Err(Error::Config(_))
        ));
    }
}
