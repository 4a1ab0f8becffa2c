// src/storage/schema.rs — Schema + migrations

use rusqlite::{params, Connection};
use tracing::info;

/// A database migration with version, name, and SQL statements.
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub up: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        up: "
        CREATE TABLE sessions (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL,
            status          TEXT NOT NULL,
            description     TEXT NOT NULL,
            device_category TEXT NOT NULL,
            image_refs      TEXT,
            result_json     TEXT,
            source          TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE entitlements (
            user_id         TEXT PRIMARY KEY,
            is_premium      INTEGER NOT NULL DEFAULT 0,
            remaining_quota INTEGER NOT NULL,
            reset_date      TEXT NOT NULL
        );

        CREATE TABLE fault_entries (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            category        TEXT NOT NULL,
            title           TEXT NOT NULL,
            symptoms        TEXT NOT NULL,
            explanation     TEXT NOT NULL,
            repair_steps    TEXT NOT NULL,
            tools_needed    TEXT NOT NULL,
            estimated_cost  TEXT NOT NULL,
            difficulty      TEXT NOT NULL,
            safety_warnings TEXT NOT NULL
        );

        CREATE INDEX idx_fault_entries_category ON fault_entries(category);
        ",
    },
    Migration {
        version: 2,
        name: "seed_fault_entries",
        up: r#"
        INSERT INTO fault_entries
            (category, title, symptoms, explanation, repair_steps, tools_needed, estimated_cost, difficulty, safety_warnings)
        VALUES
        ('device', 'Worn-out battery',
         'battery drains fast, dies suddenly, will not charge, swollen back, shuts down',
         'Lithium batteries lose capacity with age; past a few hundred charge cycles they drain quickly or the device shuts off under load.',
         '["Check battery health in the device settings if available","Replace the battery with a manufacturer-grade part","Calibrate by fully charging after replacement"]',
         '["precision screwdriver set","plastic pry tool","replacement battery"]',
         '$20-60', 'medium',
         '["Never puncture or bend a lithium battery","Stop immediately if the battery is swollen and do not charge it"]'),

        ('device', 'Damaged charging port',
         'not charging, loose cable, charges only at an angle, connector wobbles, lint',
         'Charging ports collect lint and wear mechanically; a loose or dirty connector interrupts the charge circuit long before the board fails.',
         '["Inspect the port with a flashlight","Clean it gently with a wooden toothpick or soft brush","Test with a known-good cable and charger","Replace the port assembly if the connector is physically loose"]',
         '["flashlight","wooden toothpick","replacement port assembly"]',
         '$10-50', 'medium',
         '["Power the device off before poking inside the port"]'),

        ('device', 'Display assembly failure',
         'screen black, cracked glass, flickering display, lines on screen, no image, dim backlight',
         'Impact or cable wear breaks the display assembly or its connector; the device often still runs with the screen dark.',
         '["Force-restart to rule out a software hang","Connect to an external display to confirm the device still boots","Reseat the display cable","Replace the display assembly"]',
         '["precision screwdriver set","suction cup","spudger","replacement display"]',
         '$60-200', 'medium',
         '["Disconnect the battery before unplugging the display cable"]'),

        ('device', 'Liquid damage',
         'water, liquid, wet, dropped in sink, spill, corrosion, moisture indicator red',
         'Liquid bridges contacts and corrodes traces; damage often appears days later if the device is not dried and cleaned promptly.',
         '["Power off immediately and do not charge","Open the device and disconnect the battery","Clean affected areas with 90%+ isopropyl alcohol","Let everything dry for 48 hours before reassembly"]',
         '["isopropyl alcohol","soft brush","precision screwdriver set"]',
         '$0-100', 'hard',
         '["Do not use heat to dry the device","Do not power on until fully dry"]'),

        ('pcb', 'Bulging or leaking capacitors',
         'capacitor bulging, leaking, no power, random restarts, brown residue, hum',
         'Electrolytic capacitors dry out and fail with heat and age; bulged tops or leaked electrolyte are the classic visual giveaway.',
         '["Photograph the board for reference","Desolder the failed capacitors","Fit replacements with matching capacitance and equal or higher voltage rating, observing polarity"]',
         '["soldering iron","desoldering braid","replacement capacitors","multimeter"]',
         '$5-20', 'hard',
         '["Discharge large capacitors before handling","Observe capacitor polarity or the replacement can rupture"]'),

        ('pcb', 'Blown fuse or fusible resistor',
         'no power, dead board, fuse blown, smells burnt, short circuit',
         'Input fuses sacrifice themselves on overcurrent; a blown fuse usually points at a short further downstream that should be found first.',
         '["Locate the input fuse and test continuity","Check downstream rails for shorts before replacing","Replace with the same rating only"]',
         '["multimeter","soldering iron","replacement fuse"]',
         '$2-10', 'medium',
         '["Never bridge a fuse with wire","Find the cause of the overcurrent before powering on again"]'),

        ('pcb', 'Cracked solder joints',
         'intermittent, works when pressed, stops when warm, cracked joint, dry joint, flexing',
         'Thermal cycling and board flex crack solder joints, giving intermittent faults that respond to pressure or temperature.',
         '["Inspect joints under magnification, especially around connectors and heavy parts","Reflow suspect joints with flux","Add fresh solder where the joint is dull or cratered"]',
         '["soldering iron","flux","magnifier or loupe"]',
         '$0-5', 'medium',
         '["Ventilate while soldering"]'),

        ('appliance', 'Failed thermal fuse',
         'no heat, not heating, stopped mid cycle, completely dead, dryer, oven, kettle',
         'Thermal fuses open permanently after one overheat event; a continuity test across the fuse confirms it in seconds.',
         '["Unplug the appliance","Locate the thermal fuse near the heating element","Test continuity across it","Replace with an identical temperature rating and clear the airflow blockage that caused the overheat"]',
         '["multimeter","screwdriver set","replacement thermal fuse"]',
         '$5-15', 'easy',
         '["Unplug before opening","Fix the cause of overheating or the new fuse will blow too"]'),

        ('appliance', 'Worn motor brushes or belt',
         'motor, not spinning, squealing, burning smell, drum not turning, weak suction',
         'Universal motors wear their carbon brushes down and drive belts stretch or snap; both give a powered-but-not-moving appliance.',
         '["Unplug the appliance","Inspect the drive belt for snapping or glazing","Check motor brushes for wear below the minimum length","Replace the worn part"]',
         '["screwdriver set","replacement belt or brushes","work gloves"]',
         '$10-40', 'medium',
         '["Unplug before opening","Mind stored spring tension on belt tensioners"]'),

        ('appliance', 'Blocked filter or drain pump',
         'not draining, water left, error code, bad smell, gurgling, washer, dishwasher',
         'Drain paths clog with debris long before pumps actually fail; clearing the filter and checking the impeller fixes most drain faults.',
         '["Unplug and shut off the water supply","Open the drain filter and clear debris","Spin the pump impeller by hand to check for blockage","Run a short cycle to confirm drainage"]',
         '["shallow tray for water","screwdriver set","work gloves"]',
         '$0-30', 'easy',
         '["Expect residual water when opening the filter","Unplug before reaching near the pump"]');
        "#,
    },
];

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            "Applying migration {}: {}",
            migration.version, migration.name
        );

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.up)?;
        tx.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;
    }

    Ok(())
}
