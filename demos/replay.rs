use track_overlay::{EngineConfig, Session, TrackingDataset};

fn main() -> Result<(), track_overlay::Error> {
    let mut args = std::env::args();

    let _ = args.next();
    let in_file_name = match args.next() {
        Some(name) => name,
        None => {
            eprintln!("usage: replay <tracking.json> [step_ms] [config.json]");
            std::process::exit(2);
        }
    };

    let step_ms: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(500);
    let config = match args.next() {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let dataset = TrackingDataset::from_reader(std::fs::File::open(in_file_name)?)?;
    let end_ms = dataset
        .frame_detections()
        .iter()
        .map(|f| f.t_ms)
        .chain(dataset.track_points().iter().map(|p| p.t_ms))
        .max()
        .unwrap_or(0);

    let session = Session::new(dataset, config);
    println!("{}", serde_json::to_string(session.metrics())?);

    let mut t = 0;
    while t <= end_ms {
        let frame = session.overlay(t);
        println!("{}", serde_json::to_string(&frame)?);
        t += step_ms.max(1);
    }

    Ok(())
}
