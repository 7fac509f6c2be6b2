use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{config::GeneratorConfig, model::Point, LoadResult};

use super::{Measurement, Schedule, Simulator};

pub const CPU: Measurement = Measurement {
    name: "cpu",
    fields: &[
        "usage_user",
        "usage_system",
        "usage_idle",
        "usage_nice",
        "usage_iowait",
        "usage_irq",
        "usage_softirq",
        "usage_steal",
        "usage_guest",
        "usage_guest_nice",
    ],
};

pub const DISKIO: Measurement = Measurement {
    name: "diskio",
    fields: &["reads", "writes", "read_bytes", "write_bytes", "read_time", "write_time", "io_time"],
};

pub const DISK: Measurement = Measurement {
    name: "disk",
    fields: &["total", "free", "used", "used_percent", "inodes_total", "inodes_free", "inodes_used"],
};

pub const KERNEL: Measurement = Measurement {
    name: "kernel",
    fields: &["boot_time", "interrupts", "context_switches", "processes_forked", "disk_pages_in", "disk_pages_out"],
};

pub const MEM: Measurement = Measurement {
    name: "mem",
    fields: &[
        "total",
        "available",
        "used",
        "free",
        "cached",
        "buffered",
        "used_percent",
        "available_percent",
        "buffered_percent",
    ],
};

pub const NET: Measurement = Measurement {
    name: "net",
    fields: &["bytes_sent", "bytes_recv", "packets_sent", "packets_recv", "err_in", "err_out", "drop_in", "drop_out"],
};

pub const DEVOPS_MEASUREMENTS: &[Measurement] = &[CPU, DISKIO, DISK, KERNEL, MEM, NET];
pub const CPU_ONLY_MEASUREMENTS: &[Measurement] = &[CPU];

const REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-central-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "sa-east-1",
];
const OSES: &[&str] = &["Ubuntu16.10", "Ubuntu16.04LTS", "Ubuntu15.10"];
const ARCHES: &[&str] = &["x64", "x86"];
const TEAMS: &[&str] = &["SF", "NYC", "LON", "CHI"];
const ENVIRONMENTS: &[&str] = &["production", "staging", "test"];

/// 主机的标签，顺序固定
const HOST_TAG_KEYS: &[&str] = &[
    "hostname",
    "region",
    "datacenter",
    "rack",
    "os",
    "arch",
    "team",
    "service",
    "service_version",
    "service_environment",
];

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

fn host_tags(rng: &mut StdRng, id: usize) -> Vec<String> {
    let region = pick(rng, REGIONS);
    let zone = (b'a' + rng.random_range(0..3u8)) as char;

    vec![
        format!("host_{}", id),
        region.to_string(),
        format!("{}{}", region, zone),
        rng.random_range(0..100u32).to_string(),
        pick(rng, OSES).to_string(),
        pick(rng, ARCHES).to_string(),
        pick(rng, TEAMS).to_string(),
        rng.random_range(0..20u32).to_string(),
        rng.random_range(0..2u32).to_string(),
        pick(rng, ENVIRONMENTS).to_string(),
    ]
}

/// devops 负载：每台主机每个采集间隔产生一组系统指标
#[derive(Debug, Clone)]
pub struct DevopsSimulator {
    hosts: Vec<Vec<String>>,
    measurements: &'static [Measurement],
    schedule: Schedule,
    rng: StdRng,
}

impl DevopsSimulator {
    pub fn new(config: &GeneratorConfig, measurements: &'static [Measurement]) -> LoadResult<Self> {
        let schedule = Schedule::new(config, measurements.len())?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let hosts = (0..schedule.entities()).map(|id| host_tags(&mut rng, id)).collect();

        Ok(Self {
            hosts,
            measurements,
            schedule,
            rng,
        })
    }

    /// 已经产生的数据点个数
    pub fn made_points(&self) -> u64 {
        self.schedule.made_points()
    }
}

impl Simulator for DevopsSimulator {
    fn finished(&self) -> bool {
        self.schedule.finished()
    }

    fn next(&mut self, point: &mut Point) -> bool {
        let slot = self.schedule.advance();
        let measurement = self.measurements[slot.measurement];

        point.set_measurement_name(measurement.name);
        point.set_timestamp(slot.timestamp);

        for (key, value) in HOST_TAG_KEYS.iter().zip(&self.hosts[slot.entity]) {
            point.append_tag(*key, value.as_str());
        }

        for field in measurement.fields {
            point.append_field(*field, self.rng.random_range(0.0..100.0));
        }

        true
    }
}

#[cfg(test)]
mod test_devops {
    use chrono::TimeDelta;

    use crate::{
        config::{GeneratorConfig, UseCase},
        model::{Point, TagValue},
        simulator::{Simulator, CPU_ONLY_MEASUREMENTS, DEVOPS_MEASUREMENTS},
    };

    use super::DevopsSimulator;

    fn collect(sim: &mut DevopsSimulator) -> Vec<Point> {
        let mut points = vec![];
        let mut p = Point::new();
        while !sim.finished() {
            assert!(sim.next(&mut p));
            points.push(p.clone());
            p.reset();
        }
        points
    }

    #[test]
    fn test_devops_points() {
        let config = GeneratorConfig::new(UseCase::Devops, 3).limit(18);
        let mut sim = DevopsSimulator::new(&config, DEVOPS_MEASUREMENTS).unwrap();
        let points = collect(&mut sim);

        assert_eq!(18, points.len());
        assert_eq!(18, sim.made_points());
        assert_eq!(
            vec!["cpu", "diskio", "disk", "kernel", "mem", "net"],
            points[..6].iter().map(|p| p.measurement_name()).collect::<Vec<_>>()
        );

        let p = &points[6];
        assert_eq!(("hostname".to_string(), TagValue::from("host_1")), p.tags()[0]);
        assert!(p.tags().iter().all(|(_, v)| matches!(v, TagValue::String(_))));
        assert_eq!(10, points[0].fields().len());
        assert_eq!(config.time_start, points[17].timestamp());
    }

    #[test]
    fn test_seed_is_deterministic() {
        let config = GeneratorConfig::new(UseCase::CpuOnly, 4).seed(42).limit(8);

        let a = collect(&mut DevopsSimulator::new(&config, CPU_ONLY_MEASUREMENTS).unwrap());
        let b = collect(&mut DevopsSimulator::new(&config, CPU_ONLY_MEASUREMENTS).unwrap());

        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.measurement_name() == "cpu"));
        assert_eq!(config.time_start + TimeDelta::from_std(config.log_interval).unwrap(), a[4].timestamp());
    }
}
