//! Write a synthetic EDX dataset: one `.spx` per on-sample grid node plus the
//! `Global spectrum results.xlsx` summary.
//!
//! Usage: `generate_sample [DATA_ROOT] [FOLDER]` (defaults `./data`, `sample_wafer`).

use std::fmt::{self, Write as _};
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use edx_explorer::config::EdxConfig;
use edx_explorer::data::index::{ScanIndex, ScanPosition};
use rust_xlsxwriter::Workbook;

const CHANNELS: usize = 1024;
const CALIB_LIN: f64 = 10.0;
const CALIB_ABS: f64 = -20.0;

/// `(symbol, Z, line energy in eV, line name)`; carbon is only ever fitted
/// as an overlap and ends up with zero concentration.
const ELEMENTS: [(&str, u32, f64, &str); 4] = [
    ("C", 6, 277.0, "K-Serie"),
    ("O", 8, 525.0, "K-Serie"),
    ("Fe", 26, 6400.0, "K-Serie"),
    ("Co", 27, 6930.0, "K-Serie"),
];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Atomic percentages per element at a position: a linear Fe/Co gradient
/// along x on a fixed oxygen fraction.
fn composition(position: ScanPosition, rng: &mut SimpleRng) -> [f64; 4] {
    let oxygen = 40.0 + (rng.next_f64() - 0.5) * 2.0;
    let metal = 100.0 - oxygen;
    let fe_share = (0.5 + position.x_mm / 160.0).clamp(0.0, 1.0);
    [0.0, oxygen, metal * fe_share, metal * (1.0 - fe_share)]
}

fn spectrum_counts(percent: &[f64; 4], rng: &mut SimpleRng) -> Vec<u64> {
    (0..CHANNELS)
        .map(|k| {
            let energy = (k + 1) as f64 * CALIB_LIN + CALIB_ABS;
            let background = 40.0 * (-energy / 4000.0).exp();
            let peaks: f64 = ELEMENTS
                .iter()
                .zip(percent)
                .map(|(&(_, _, line, _), &pct)| gaussian(energy, line, 60.0, pct * 25.0))
                .sum();
            (background + peaks + rng.next_f64() * 6.0).round() as u64
        })
        .collect()
}

fn spx_document(
    index: ScanIndex,
    percent: &[f64; 4],
    counts: &[u64],
) -> Result<String, fmt::Error> {
    let mut results = String::new();
    let mut elements = String::new();
    for (&(symbol, z, _, line), &pct) in ELEMENTS.iter().zip(percent) {
        write!(
            results,
            "      <Result>\n        <Atom>{z}</Atom>\n        <XLine>{line}</XLine>\n        \
             <AtomPercent>{:.6}</AtomPercent>\n        <MassPercent>{:.6}</MassPercent>\n        \
             <NetIntens>{:.0}</NetIntens>\n        <Background>40</Background>\n        \
             <Sigma>{:.6}</Sigma>\n      </Result>\n",
            pct / 100.0,
            pct / 100.0,
            pct * 25.0 * 150.0,
            0.002 + pct / 10000.0,
        )?;
        write!(
            elements,
            "        <ClassInstance Type=\"TRTPSEElement\" Name=\"{symbol}\">\n          \
             <TRTPSEElement><Element>{z}</Element></TRTPSEElement>\n        </ClassInstance>\n"
        )?;
    }
    let channels = counts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",");

    Ok(format!(
        r#"<?xml version="1.0" encoding="WINDOWS-1252" standalone="yes"?>
<TRTSpectrum>
  <ClassInstance Type="TRTSpectrum" Name="{label}">
    <ClassInstance Type="TRTSpectrumHardwareHeader" Name="Hardware">
      <PrimaryEnergy>20</PrimaryEnergy>
      <WorkingDistance>11.3</WorkingDistance>
    </ClassInstance>
    <ClassInstance Type="TRTSpectrumHeader" Name="Header">
      <ChannelCount>{CHANNELS}</ChannelCount>
      <CalibAbs>{CALIB_ABS}</CalibAbs>
      <CalibLin>{CALIB_LIN}</CalibLin>
    </ClassInstance>
    <ClassInstance Type="TRTResult" Name="Results">
{results}      <ExtResults/>
    </ClassInstance>
    <ClassInstance Type="TRTContainerClass" Name="Elements">
      <ChildClassInstances>
{elements}      </ChildClassInstances>
    </ClassInstance>
    <Channels>{channels}</Channels>
  </ClassInstance>
</TRTSpectrum>
"#,
        label = index.label(),
    ))
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let data_root = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./data"));
    let folder = args.next().unwrap_or_else(|| "sample_wafer".to_string());

    let config = EdxConfig {
        data_root,
        ..Default::default()
    };
    let dir = config.dataset_dir(&folder);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let mut rows: Vec<(ScanIndex, [f64; 4])> = Vec::new();

    for index in config.grid.indices() {
        let position = config.grid.to_position(index);
        if !config.on_sample(position) {
            continue;
        }
        let percent = composition(position, &mut rng);
        let counts = spectrum_counts(&percent, &mut rng);
        let path = config.spectrum_path(&folder, index);
        fs::write(&path, spx_document(index, &percent, &counts)?)
            .with_context(|| format!("writing {}", path.display()))?;
        rows.push((index, percent));
    }

    // Summary workbook: header, one row per point, then mean / sigma rows.
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Spectrum")?;
    for (col, &(symbol, ..)) in ELEMENTS.iter().enumerate() {
        sheet.write_string(0, col as u16 + 1, symbol)?;
    }
    for (r, (index, percent)) in rows.iter().enumerate() {
        let row = r as u32 + 1;
        sheet.write_string(row, 0, index.label())?;
        for (col, &pct) in percent.iter().enumerate() {
            sheet.write_number(row, col as u16 + 1, pct)?;
        }
    }

    let n = rows.len().max(1) as f64;
    let mut means = [0.0; 4];
    for (_, percent) in &rows {
        for (mean, pct) in means.iter_mut().zip(percent) {
            *mean += pct / n;
        }
    }
    let mut sigmas = [0.0; 4];
    for (_, percent) in &rows {
        for ((sigma, pct), mean) in sigmas.iter_mut().zip(percent).zip(&means) {
            *sigma += (pct - mean).powi(2) / n;
        }
    }
    let stats_row = rows.len() as u32 + 1;
    for (offset, (label, values)) in [
        ("Mean value:", means),
        ("Sigma:", sigmas.map(f64::sqrt)),
        ("Sigma mean:", sigmas.map(|s| s.sqrt() / n.sqrt())),
    ]
    .into_iter()
    .enumerate()
    {
        let row = stats_row + offset as u32;
        sheet.write_string(row, 0, label)?;
        for (col, value) in values.iter().enumerate() {
            sheet.write_number(row, col as u16 + 1, *value)?;
        }
    }

    let summary = config.summary_path(&folder);
    workbook
        .save(&summary)
        .with_context(|| format!("writing {}", summary.display()))?;

    println!(
        "Wrote {} spectra ({CHANNELS} channels each) and {} to {}",
        rows.len(),
        summary
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default(),
        dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use edx_explorer::data::spx::parse_spx;

    #[test]
    fn test_generated_document_parses() {
        let mut rng = SimpleRng::new(7);
        let position = ScanPosition::new(10.0, -5.0);
        let percent = composition(position, &mut rng);
        let counts = spectrum_counts(&percent, &mut rng);
        let xml = spx_document(ScanIndex::new(11, 8), &percent, &counts).unwrap();

        let record = parse_spx(&xml).unwrap();
        assert_eq!(record.spectrum.len(), CHANNELS);
        assert_eq!(record.results.len(), ELEMENTS.len());
        assert_eq!(record.elements.len(), ELEMENTS.len());
        assert_eq!(record.elements[2].name, "Fe");
        assert_eq!(record.primary_energy_kv, Some(20));
    }
}
