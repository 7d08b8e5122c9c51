//! Application constants for the padron analyzer
//!
//! Registry layouts, classification markers, output file names and
//! default values shared by the parser, the catalog loader and the
//! analysis engine.

// =============================================================================
// Registry Format
// =============================================================================

/// Field delimiter of registry files and of every output file
pub const FIELD_DELIMITER: char = '|';

/// Quote mark wrapped around registry lines and fields
pub const QUOTE_CHAR: char = '\'';

/// Escape character used by classification sinks
pub const ESCAPE_CHAR: char = '\\';

/// Field delimiter of reference catalog files
pub const CATALOG_DELIMITER: u8 = b';';

/// File pattern of candidate registry sources under the input root
pub const SOURCE_FILE_PATTERN: &str = "*.txt";

/// Fixed layout of the prepaid-medicine (EMP) registry
pub const EMP_COLUMNS: &[&str] = &[
    "sin_uso",
    "codigo_emp",
    "cuil_titular",
    "codigo_parentesco",
    "cuil_beneficiario",
    "tipo_documento",
    "numero_documento",
    "nombre_apellido",
    "sexo",
    "fecha_nacimiento",
    "nacionalidad",
    "calle",
    "puerta",
    "piso",
    "departamento",
    "localidad",
    "codigo_postal",
    "id_provincia",
    "fijo",
    "celular",
    "mail",
    "discapacidad",
    "preexistente",
    "nombre_preexistente",
    "afiliado",
    "tipo_plan",
    "codigo_afiliacion",
    "ahesion",
    "corporativo",
    "cuit_empleador",
    "rnos",
    "copago",
    "valor",
    "fecha_alta_entidad",
    "fecha_alta_plan",
    "fecha_actualizacion",
    "movimiento",
    "sin_uso_1",
    "sin_uso_2",
    "sin_uso_3",
    "periodo",
];

/// Number of leading schema fields forming the duplicate key
pub const DUPLICATE_KEY_WIDTH: usize = 5;

// =============================================================================
// Column Names
// =============================================================================

pub mod columns {
    pub const BENEFICIARY_ID: &str = "cuil_beneficiario";
    pub const TITLEHOLDER_ID: &str = "cuil_titular";
    pub const EMPLOYER_ID: &str = "cuit_empleador";
    pub const PLAN_CODE: &str = "codigo_emp";
    pub const INSURER_CODE: &str = "codigo_os";
    pub const BIRTH_DATE: &str = "fecha_nacimiento";
    pub const PROVINCE: &str = "id_provincia";
    pub const PLAN_TYPE: &str = "tipo_plan";

    /// Extra column appended to rows of the error sink
    pub const ERROR_FIELD: &str = "campo_error";

    /// Columns kept as exact text end to end (leading zeros matter)
    pub const IDENTIFIERS: &[&str] = &[
        BENEFICIARY_ID,
        TITLEHOLDER_ID,
        EMPLOYER_ID,
        PLAN_CODE,
        INSURER_CODE,
        BIRTH_DATE,
    ];
}

// =============================================================================
// Classification Markers
// =============================================================================

/// `tipo_plan` value selecting primary/partial-plan EMP records
pub const PARTIAL_PLAN_MARKER: &str = "P";

/// Insurer code tracked as its own bucket (PAMI)
pub const DISTINGUISHED_INSURER: &str = "500807";

/// Width of the zero-padded province code
pub const PROVINCE_CODE_WIDTH: usize = 2;

/// Catalog fields validated as a 1-2 digit number instead of set membership
pub const PATTERN_EXEMPT_FIELDS: &[&str] = &["discapacidad", "preexistente", "corporativo", "copago"];

/// Rule applied to pattern-exempt fields
pub const PATTERN_EXEMPT_RULE: &str = r"^\d{1,2}$";

// =============================================================================
// Reference Catalogs
// =============================================================================

pub mod catalog {
    pub const EMP_FILE: &str = "EMP.csv";
    pub const OSN_FILE: &str = "OSN.csv";

    /// Normalized header of the column naming each field
    pub const FIELD_COLUMN: &str = "campo";

    /// Normalized header of the column listing `code=label` pairs
    pub const REFERENCES_COLUMN: &str = "referencias";

    pub const ENTRY_SEPARATOR: char = ';';
    pub const CODE_SEPARATOR: char = '=';
}

// =============================================================================
// Output Files
// =============================================================================

pub mod sinks {
    pub const PARTIAL_PLAN: &str = "Plan_Parcial.csv";
    pub const MULTI_AFFILIATION_DISTINGUISHED: &str = "Multi-CUIT_PAMI.csv";
    pub const MULTI_AFFILIATION_OTHER: &str = "Pluriempleo_OSN.csv";
    pub const DUPLICATES: &str = "Duplicados.csv";
    pub const ERRORS: &str = "Errores.csv";

    pub const REPORT_EMP: &str = "Resumen_EMP.txt";
    pub const REPORT_DISTINGUISHED: &str = "Resumen_PAMI.txt";
    pub const REPORT_OTHER: &str = "Resumen_Resto_OSN.txt";

    /// Prefix of per-run working directories
    pub const WORK_DIR_PREFIX: &str = "anal_";

    /// Prefix of unified output files
    pub const UNIFIED_PREFIX: &str = "unif_";

    /// Timestamp layout of delivered archive names
    pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
}

// =============================================================================
// Defaults
// =============================================================================

/// Rows per chunk when streaming a registry
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Lifetime of cached reference catalogs in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3 * 3600;

/// Default number of rows shown when previewing a sink
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Fraction of system memory above which a warning is logged
pub const DEFAULT_MEMORY_THRESHOLD: f64 = 0.8;

pub const DEFAULT_INPUT_DIR: &str = "padrones";
pub const DEFAULT_REFERENCE_DIR: &str = "referencias";
pub const DEFAULT_CACHE_DIR: &str = ".cache";
pub const APP_CACHE_NAME: &str = "padron-analyzer";
