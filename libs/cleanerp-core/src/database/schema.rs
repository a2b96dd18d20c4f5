//! SQLite schema
//!
//! Every statement is idempotent so [`SCHEMA`] can run on each start.
//! Identifiers are UUID text, calendar dates are `YYYY-MM-DD` text and
//! timestamps are RFC 3339 text.

/// Current schema version, recorded in `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Tables in dependency order
pub const TABLES: &[&str] = &[
    "clients",
    "sites",
    "contracts",
    "contract_sites",
    "employees",
    "work_orders",
    "work_order_assignments",
    "leads",
    "quotes",
];

pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY NOT NULL,
    company_name TEXT NOT NULL,
    contact_name TEXT,
    contact_email TEXT,
    contact_phone TEXT,
    billing_address TEXT,
    city TEXT,
    state TEXT,
    postcode TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    payment_terms_days INTEGER,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sites (
    id TEXT PRIMARY KEY NOT NULL,
    client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    site_name TEXT NOT NULL,
    address TEXT NOT NULL,
    city TEXT,
    state TEXT,
    postcode TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    site_type TEXT,
    contact_name TEXT,
    contact_phone TEXT,
    special_instructions TEXT,
    latitude REAL,
    longitude REAL,
    square_meters REAL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sites_client_id ON sites(client_id);

CREATE TABLE IF NOT EXISTS contracts (
    id TEXT PRIMARY KEY NOT NULL,
    client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    contract_number TEXT NOT NULL UNIQUE,
    contract_name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    start_date TEXT NOT NULL,
    end_date TEXT,
    billing_frequency TEXT NOT NULL,
    contract_value REAL NOT NULL DEFAULT 0,
    auto_renew INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_contracts_client_id ON contracts(client_id);

CREATE TABLE IF NOT EXISTS contract_sites (
    contract_id TEXT NOT NULL REFERENCES contracts(id) ON DELETE CASCADE,
    site_id TEXT NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    PRIMARY KEY (contract_id, site_id)
);

CREATE TABLE IF NOT EXISTS employees (
    id TEXT PRIMARY KEY NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    job_title TEXT,
    department TEXT,
    employment_type TEXT NOT NULL DEFAULT 'full_time',
    status TEXT NOT NULL DEFAULT 'active',
    start_date TEXT,
    hourly_rate REAL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS work_orders (
    id TEXT PRIMARY KEY NOT NULL,
    site_id TEXT NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    contract_id TEXT REFERENCES contracts(id) ON DELETE SET NULL,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT NOT NULL DEFAULT 'medium',
    status TEXT NOT NULL DEFAULT 'draft',
    scheduled_date TEXT,
    due_date TEXT,
    completed_date TEXT,
    estimated_hours REAL,
    actual_hours REAL,
    estimated_cost REAL,
    actual_cost REAL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_work_orders_site_id ON work_orders(site_id);
CREATE INDEX IF NOT EXISTS idx_work_orders_contract_id ON work_orders(contract_id);

CREATE TABLE IF NOT EXISTS work_order_assignments (
    work_order_id TEXT NOT NULL REFERENCES work_orders(id) ON DELETE CASCADE,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    assigned_at TEXT NOT NULL,
    PRIMARY KEY (work_order_id, employee_id)
);

CREATE TABLE IF NOT EXISTS leads (
    id TEXT PRIMARY KEY NOT NULL,
    company_name TEXT NOT NULL,
    contact_name TEXT,
    email TEXT,
    phone TEXT,
    source TEXT,
    status TEXT NOT NULL DEFAULT 'new',
    estimated_value REAL,
    estimated_frequency TEXT NOT NULL DEFAULT 'monthly',
    next_follow_up TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quotes (
    id TEXT PRIMARY KEY NOT NULL,
    quote_number TEXT NOT NULL UNIQUE,
    lead_id TEXT REFERENCES leads(id) ON DELETE SET NULL,
    client_id TEXT REFERENCES clients(id) ON DELETE SET NULL,
    title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    amount REAL NOT NULL DEFAULT 0,
    billing_frequency TEXT NOT NULL,
    issue_date TEXT NOT NULL,
    valid_until TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";
