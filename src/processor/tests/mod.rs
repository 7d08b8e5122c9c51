//! Integration tests for the processor module
//!
//! Tests the complete analysis pipeline over registry fixtures written into
//! temporary input, reference and cache directories.

pub mod osn_analysis;

use crate::config::AnalyzerConfig;
use crate::constants::EMP_COLUMNS;
use crate::parser::encode_latin1;
use crate::processor::PadronProcessor;
use crate::processor::writer::sample_rows;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// OSN layout: the first five columns form the duplicate key. Catalogs are
/// written in the registry code page.
pub const OSN_CATALOG: &str = "\
Campo;Descripción;Referencias
CUIL Beneficiario;Beneficiario;
Código OS;Obra social;\"500807=PAMI;0125=OSDE;1001=OSECAC\"
CUIT Empleador;Empleador;
CUIL Titular;Titular;
Sexo;Sexo;\"1=M;2=F\"
Id Provincia;Provincia;\"01=CABA;02=Buenos Aires;05=Córdoba;12=La Rioja\"
Discapacidad;Marca;\"0=No;1=Si\"
";

pub const EMP_CATALOG: &str = "\
Campo;Referencias
Sexo;\"1=M;2=F\"
Id Provincia;\"01=CABA;02=Buenos Aires;05=Córdoba\"
";

/// Temporary input/reference/cache layout
pub struct Workspace {
    pub dir: TempDir,
    pub config: AnalyzerConfig,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = AnalyzerConfig::default()
            .with_input_root(dir.path().join("padrones"))
            .with_reference_root(dir.path().join("referencias"))
            .with_cache_root(dir.path().join("cache"))
            .with_chunk_size(2)
            .with_progress(false);

        fs::create_dir_all(&config.input_root).unwrap();
        fs::create_dir_all(&config.reference_root).unwrap();
        Self { dir, config }
    }

    pub fn with_osn_catalog(self) -> Self {
        fs::write(
            self.config.reference_root.join("OSN.csv"),
            encode_latin1(OSN_CATALOG),
        )
        .unwrap();
        self
    }

    pub fn with_emp_catalog(self) -> Self {
        fs::write(
            self.config.reference_root.join("EMP.csv"),
            encode_latin1(EMP_CATALOG),
        )
        .unwrap();
        self
    }

    /// Write a registry source under the input root
    pub fn source(&self, name: &str, lines: &[String]) -> PathBuf {
        let path = self.config.input_root.join(name);
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&path, content).unwrap();
        path
    }

    pub fn processor(&self) -> PadronProcessor {
        PadronProcessor::new(self.config.clone()).unwrap()
    }

    pub fn cache_root(&self) -> &Path {
        &self.config.cache_root
    }
}

/// OSN line: beneficiary, insurer, employer, titleholder, sex, province, disability
pub fn osn_line(fields: [&str; 7]) -> String {
    fields.join("|")
}

/// EMP line with every column empty except the given overrides; `sexo` and
/// `id_provincia` default to valid codes
pub fn emp_line(overrides: &[(&str, &str)]) -> String {
    EMP_COLUMNS
        .iter()
        .map(|column| {
            overrides
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| match *column {
                    "sexo" => "1".to_string(),
                    "id_provincia" => "01".to_string(),
                    _ => String::new(),
                })
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Data rows of a sink, empty when it was never written
pub fn sink_rows(path: &Path) -> Vec<Vec<String>> {
    sample_rows(path, usize::MAX).unwrap().rows
}

/// Working directories currently under the cache root
pub fn work_dirs(cache_root: &Path) -> Vec<PathBuf> {
    match fs::read_dir(cache_root) {
        Ok(entries) => entries.map(|entry| entry.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
