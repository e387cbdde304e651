use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADERS: [&str; 12] = [
    "Cliente",
    "Estatus",
    "Forma de pago",
    "Póliza",
    "Fecha de vigencia",
    "Pago aseguradora",
    "Producto",
    "Prima neta",
    "Prima total",
    "% Comisión",
    "Comisión neta",
    "Importe a liquidar",
];

/// Writes `rows` monthly policies, all effective 2024-11-15, each with a net
/// premium of 1000 and 900 to settle.
pub fn generate_ledger_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(HEADERS)?;

    for i in 1..=rows {
        wtr.write_record([
            format!("Cliente {i}").as_str(),
            "ALTA",
            "MENSUAL",
            format!("POL-{i:05}").as_str(),
            "2024-11-15",
            "90",
            "Autos",
            "1000",
            "1160",
            "10",
            "95",
            "900",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
