use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::GeneratorConfig,
    model::{Point, TagValue},
    LoadResult,
};

use super::{Measurement, Schedule, Simulator};

pub const READINGS: Measurement = Measurement {
    name: "readings",
    fields: &["latitude", "longitude", "elevation", "velocity", "heading", "grade", "fuel_consumption"],
};

pub const DIAGNOSTICS: Measurement = Measurement {
    name: "diagnostics",
    fields: &["load", "fuel_state", "status"],
};

pub const IOT_MEASUREMENTS: &[Measurement] = &[READINGS, DIAGNOSTICS];

const FLEETS: &[&str] = &["East", "West", "North", "South"];
const DRIVERS: &[&str] = &["Albert", "Derek", "Trish", "Rodney", "Seth", "Andy"];
const MODELS: &[&str] = &["F-150", "G-2000", "H-2"];
const DEVICE_VERSIONS: &[&str] = &["v1.0", "v1.5", "v2.0", "v2.3"];
const LOAD_CAPACITIES: &[f64] = &[1500.0, 2000.0, 5000.0];
const FUEL_CAPACITIES: &[f64] = &[150.0, 200.0, 300.0];
const FUEL_CONSUMPTIONS: &[f64] = &[15.0, 20.0, 25.0];

/// 卡车缺少某个标签值的概率
const MISSING_TAG_PROBABILITY: f64 = 0.05;

/// 某一次读数丢失（不写入）的概率
const MISSING_READING_PROBABILITY: f64 = 0.01;

const TRUCK_TAG_KEYS: &[&str] = &[
    "name",
    "fleet",
    "driver",
    "model",
    "device_version",
    "load_capacity",
    "fuel_capacity",
    "nominal_fuel_consumption",
];

fn pick_str(rng: &mut StdRng, items: &[&str]) -> TagValue {
    if rng.random_bool(MISSING_TAG_PROBABILITY) {
        return TagValue::Null;
    }
    TagValue::from(items[rng.random_range(0..items.len())])
}

fn pick_f64(rng: &mut StdRng, items: &[f64]) -> TagValue {
    TagValue::from(items[rng.random_range(0..items.len())])
}

/// 卡车的标签。容量类的标签是浮点数，和负载定义保持一致
fn truck_tags(rng: &mut StdRng, id: usize) -> Vec<TagValue> {
    let name = if rng.random_bool(MISSING_TAG_PROBABILITY) {
        TagValue::Null
    } else {
        TagValue::from(format!("truck_{}", id))
    };

    vec![
        name,
        pick_str(rng, FLEETS),
        pick_str(rng, DRIVERS),
        pick_str(rng, MODELS),
        pick_str(rng, DEVICE_VERSIONS),
        pick_f64(rng, LOAD_CAPACITIES),
        pick_f64(rng, FUEL_CAPACITIES),
        pick_f64(rng, FUEL_CONSUMPTIONS),
    ]
}

/// iot 负载：每辆卡车每个采集间隔产生读数和诊断数据，偶尔会丢失一次读数
#[derive(Debug, Clone)]
pub struct IotSimulator {
    trucks: Vec<Vec<TagValue>>,
    schedule: Schedule,
    rng: StdRng,
}

impl IotSimulator {
    pub fn new(config: &GeneratorConfig) -> LoadResult<Self> {
        let schedule = Schedule::new(config, IOT_MEASUREMENTS.len())?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let trucks = (0..schedule.entities()).map(|id| truck_tags(&mut rng, id)).collect();

        Ok(Self { trucks, schedule, rng })
    }
}

impl Simulator for IotSimulator {
    fn finished(&self) -> bool {
        self.schedule.finished()
    }

    fn next(&mut self, point: &mut Point) -> bool {
        let slot = self.schedule.advance();

        if self.rng.random_bool(MISSING_READING_PROBABILITY) {
            return false;
        }

        let measurement = IOT_MEASUREMENTS[slot.measurement];
        point.set_measurement_name(measurement.name);
        point.set_timestamp(slot.timestamp);

        for (key, value) in TRUCK_TAG_KEYS.iter().zip(&self.trucks[slot.entity]) {
            point.append_tag(*key, value.clone());
        }

        for field in measurement.fields {
            point.append_field(*field, self.rng.random_range(0.0..100.0));
        }

        true
    }
}

#[cfg(test)]
mod test_iot {
    use crate::{
        config::{GeneratorConfig, UseCase},
        model::{Point, TagValue},
        simulator::Simulator,
    };

    use super::IotSimulator;

    #[test]
    fn test_iot_points() {
        let config = GeneratorConfig::new(UseCase::Iot, 10).seed(7).limit(2000);
        let mut sim = IotSimulator::new(&config).unwrap();

        let mut p = Point::new();
        let mut yields = 0;
        let mut written = 0;

        while !sim.finished() {
            yields += 1;
            if sim.next(&mut p) {
                written += 1;
                assert!(["readings", "diagnostics"].contains(&p.measurement_name()));
                assert_eq!(8, p.tags().len());
                assert!(matches!(p.tags()[5].1, TagValue::Double(_)));
            } else {
                assert!(p.is_empty());
            }
            p.reset();
        }

        assert_eq!(2000, yields);
        assert!(written > 1900 && written < 2000, "written: {}", written);
    }
}
