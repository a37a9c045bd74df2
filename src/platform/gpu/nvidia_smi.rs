use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use roxmltree::{Document, Node, ParsingOptions};

use crate::core::system_monitor::{
    MetricDescriptor, MetricInfo, MetricKind, Reading, SourceAdapter,
};
use crate::error::{Result, SenseError};

/// Produces the XML log printed by `nvidia-smi -x -q`.
pub trait GpuLogSource: Send {
    fn fetch(&self) -> Result<String>;
}

/// Runs the `nvidia-smi` binary found on `PATH`.
pub struct NvidiaSmiCommand {
    program: PathBuf,
    timeout: Duration,
}

impl NvidiaSmiCommand {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn locate() -> Result<Self> {
        let program = which::which("nvidia-smi")
            .map_err(|e| SenseError::gpu_not_available(format!("nvidia-smi not found: {}", e)))?;

        Ok(Self {
            program,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }
}

impl GpuLogSource for NvidiaSmiCommand {
    fn fetch(&self) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(["-x", "-q"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| SenseError::metric_collection("nvidia-smi stdout not captured"))?;

        // Drain stdout concurrently so a large log cannot block the child.
        let reader = thread::spawn(move || {
            let mut output = String::new();
            stdout.read_to_string(&mut output).map(|_| output)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SenseError::metric_collection(format!(
                    "nvidia-smi timed out after {:?}",
                    self.timeout
                )));
            }
            thread::sleep(Duration::from_millis(25));
        };

        let output = reader
            .join()
            .map_err(|_| SenseError::metric_collection("nvidia-smi reader thread panicked"))??;

        if !status.success() {
            return Err(SenseError::metric_collection(format!(
                "nvidia-smi exited with {}",
                status
            )));
        }

        Ok(output)
    }
}

/// A raw value taken from the log, still in its textual form (`"45 C"`).
#[derive(Debug, Clone, PartialEq)]
pub struct GpuValue {
    pub text: String,
    pub info: MetricInfo,
}

impl GpuValue {
    /// Leading number of the text; `None` for "N/A" and similar.
    pub fn number(&self) -> Option<f64> {
        self.text
            .split_whitespace()
            .next()?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

/// Metrics of one GPU, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuRecord {
    /// `GPU #<index>: <product name>`
    pub id: String,
    pub values: Vec<(String, GpuValue)>,
}

struct GpuField {
    label: &'static str,
    /// Element paths below `<gpu>`, first match wins.
    paths: &'static [&'static [&'static str]],
    kind: MetricKind,
}

const GPU_FIELDS: &[GpuField] = &[
    GpuField {
        label: "Temperature",
        paths: &[&["temperature", "gpu_temp"]],
        kind: MetricKind::Temperature,
    },
    GpuField {
        label: "Fan Speed",
        paths: &[&["fan_speed"]],
        kind: MetricKind::Usage,
    },
    GpuField {
        label: "Usage",
        paths: &[&["utilization", "gpu_util"]],
        kind: MetricKind::Usage,
    },
    GpuField {
        label: "VRAM Usage",
        paths: &[&["utilization", "memory_util"]],
        kind: MetricKind::Usage,
    },
    GpuField {
        label: "Encoder Usage",
        paths: &[&["utilization", "encoder_util"]],
        kind: MetricKind::Usage,
    },
    GpuField {
        label: "Decoder Usage",
        paths: &[&["utilization", "decoder_util"]],
        kind: MetricKind::Usage,
    },
    GpuField {
        label: "Power Draw",
        paths: &[
            &["power_readings", "power_draw"],
            &["gpu_power_readings", "power_draw"],
        ],
        kind: MetricKind::Power,
    },
    GpuField {
        label: "Graphics Clock",
        paths: &[&["clocks", "graphics_clock"]],
        kind: MetricKind::Frequency,
    },
    GpuField {
        label: "SM Clock",
        paths: &[&["clocks", "sm_clock"]],
        kind: MetricKind::Frequency,
    },
    GpuField {
        label: "Memory Clock",
        paths: &[&["clocks", "mem_clock"]],
        kind: MetricKind::Frequency,
    },
    GpuField {
        label: "Video Clock",
        paths: &[&["clocks", "video_clock"]],
        kind: MetricKind::Frequency,
    },
];

fn child_text<'a, 'input>(node: Node<'a, 'input>, path: &[&str]) -> Option<&'a str> {
    let mut current = node;
    for tag in path {
        current = current.children().find(|n| n.has_tag_name(*tag))?;
    }
    current.text().map(str::trim)
}

/// Parse an `nvidia-smi -x -q` log into one record per `<gpu>` element.
pub fn parse_gpu_log(xml: &str) -> Result<Vec<GpuRecord>> {
    // The log always carries a DOCTYPE naming its DTD.
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| SenseError::metric_collection(format!("Malformed nvidia-smi log: {}", e)))?;

    let records = doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("gpu"))
        .enumerate()
        .map(|(index, gpu)| {
            let model = child_text(gpu, &["product_name"])
                .filter(|name| !name.is_empty())
                .unwrap_or("Unknown GPU");

            let values = GPU_FIELDS
                .iter()
                .filter_map(|field| {
                    let text = field.paths.iter().find_map(|path| child_text(gpu, path))?;
                    Some((
                        field.label.to_string(),
                        GpuValue {
                            text: text.to_string(),
                            info: MetricInfo::of_kind(field.kind),
                        },
                    ))
                })
                .collect();

            GpuRecord {
                id: format!("GPU #{}: {}", index, model),
                values,
            }
        })
        .collect();

    Ok(records)
}

/// GPU source backed by nvidia-smi's XML log.
pub struct NvidiaSmiAdapter<S: GpuLogSource = NvidiaSmiCommand> {
    log_source: S,
    descriptors: Vec<MetricDescriptor>,
}

impl<S: GpuLogSource> NvidiaSmiAdapter<S> {
    /// Query the tool once; metrics that carry a number now are the ones
    /// reported from then on.
    pub fn probe(log_source: S) -> Result<Self> {
        let records = parse_gpu_log(&log_source.fetch()?)?;
        if records.is_empty() {
            return Err(SenseError::gpu_not_available("nvidia-smi reported no GPUs"));
        }

        let descriptors: Vec<_> = records
            .iter()
            .flat_map(|record| {
                record
                    .values
                    .iter()
                    .filter(|(_, value)| value.number().is_some())
                    .map(|(label, value)| {
                        MetricDescriptor::new(&record.id, label, value.info.clone())
                    })
            })
            .collect();

        log::info!(
            "nvidia-smi: {} GPUs, {} metrics",
            records.len(),
            descriptors.len()
        );

        Ok(Self {
            log_source,
            descriptors,
        })
    }
}

impl<S: GpuLogSource> SourceAdapter for NvidiaSmiAdapter<S> {
    fn name(&self) -> &str {
        "nvidia-smi"
    }

    fn describe(&self) -> Vec<MetricDescriptor> {
        self.descriptors.clone()
    }

    fn poll(&mut self) -> Result<Vec<Reading>> {
        let records = parse_gpu_log(&self.log_source.fetch()?)?;

        Ok(records
            .into_iter()
            .flat_map(|record| {
                let GpuRecord { id, values } = record;
                values.into_iter().filter_map(move |(label, value)| {
                    value.number().map(|n| Reading::new(id.clone(), label, n))
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const LOG: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE nvidia_smi_log SYSTEM "nvsmi_device_v12.dtd">
<nvidia_smi_log>
    <driver_version>550.54.14</driver_version>
    <attached_gpus>1</attached_gpus>
    <gpu id="00000000:01:00.0">
        <product_name>NVIDIA GeForce RTX 3070</product_name>
        <fan_speed>34 %</fan_speed>
        <utilization>
            <gpu_util>12 %</gpu_util>
            <memory_util>7 %</memory_util>
            <encoder_util>0 %</encoder_util>
            <decoder_util>N/A</decoder_util>
        </utilization>
        <temperature>
            <gpu_temp>47 C</gpu_temp>
        </temperature>
        <gpu_power_readings>
            <power_draw>36.70 W</power_draw>
        </gpu_power_readings>
        <clocks>
            <graphics_clock>1005 MHz</graphics_clock>
            <sm_clock>1005 MHz</sm_clock>
            <mem_clock>7000 MHz</mem_clock>
            <video_clock>900 MHz</video_clock>
        </clocks>
    </gpu>
</nvidia_smi_log>
"#;

    /// Hands out queued logs; repeats the last one when drained.
    #[derive(Clone)]
    struct FakeLog(Arc<Mutex<Vec<Result<String>>>>);

    impl FakeLog {
        fn new(logs: Vec<Result<String>>) -> Self {
            Self(Arc::new(Mutex::new(logs)))
        }
    }

    impl GpuLogSource for FakeLog {
        fn fetch(&self) -> Result<String> {
            let mut logs = self.0.lock().unwrap();
            if logs.len() > 1 {
                logs.remove(0)
            } else {
                match logs.first() {
                    Some(Ok(log)) => Ok(log.clone()),
                    _ => Err(SenseError::metric_collection("no log")),
                }
            }
        }
    }

    #[test]
    fn test_parse_record() {
        let records = parse_gpu_log(LOG).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.id, "GPU #0: NVIDIA GeForce RTX 3070");

        let labels: Vec<_> = record.values.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Temperature",
                "Fan Speed",
                "Usage",
                "VRAM Usage",
                "Encoder Usage",
                "Decoder Usage",
                "Power Draw",
                "Graphics Clock",
                "SM Clock",
                "Memory Clock",
                "Video Clock"
            ]
        );

        let (_, power) = &record.values[6];
        assert_eq!(power.text, "36.70 W");
        assert_eq!(power.number(), Some(36.7));
        assert_eq!(power.info.kind, MetricKind::Power);
    }

    #[test]
    fn test_not_available_has_no_number() {
        let records = parse_gpu_log(LOG).unwrap();
        let decoder = records[0]
            .values
            .iter()
            .find(|(l, _)| l == "Decoder Usage")
            .map(|(_, v)| v)
            .unwrap();

        assert_eq!(decoder.text, "N/A");
        assert_eq!(decoder.number(), None);
    }

    #[test]
    fn test_doctype_header_is_accepted() {
        let log = r#"<?xml version="1.0" ?>
<!DOCTYPE nvidia_smi_log SYSTEM "nvsmi_device_v12.dtd">
<nvidia_smi_log><gpu><product_name>Tesla T4</product_name></gpu></nvidia_smi_log>"#;

        let records = parse_gpu_log(log).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "GPU #0: Tesla T4");
        assert!(records[0].values.is_empty());
    }

    #[test]
    fn test_malformed_log_is_error() {
        assert!(parse_gpu_log("<nvidia_smi_log><gpu>").is_err());
    }

    #[test]
    fn test_probe_skips_unavailable_metrics() {
        let adapter = NvidiaSmiAdapter::probe(FakeLog::new(vec![Ok(LOG.to_string())])).unwrap();
        let descriptors = adapter.describe();

        assert_eq!(descriptors.len(), 10);
        assert!(descriptors.iter().all(|d| d.label != "Decoder Usage"));
        assert!(descriptors
            .iter()
            .all(|d| d.group == "GPU #0: NVIDIA GeForce RTX 3070"));
    }

    #[test]
    fn test_probe_without_gpus_fails() {
        let empty = "<nvidia_smi_log><attached_gpus>0</attached_gpus></nvidia_smi_log>";
        let result = NvidiaSmiAdapter::probe(FakeLog::new(vec![Ok(empty.to_string())]));
        assert!(matches!(result, Err(SenseError::GpuNotAvailable(_))));
    }

    #[test]
    fn test_poll_reads_numbers() {
        let mut adapter =
            NvidiaSmiAdapter::probe(FakeLog::new(vec![Ok(LOG.to_string())])).unwrap();
        let readings = adapter.poll().unwrap();

        let temp = readings.iter().find(|r| r.label == "Temperature").unwrap();
        assert_eq!(temp.value, 47.0);
        assert_eq!(temp.group, "GPU #0: NVIDIA GeForce RTX 3070");
        assert!(readings.iter().all(|r| r.label != "Decoder Usage"));
    }

    #[test]
    fn test_poll_propagates_fetch_failure() {
        let log = FakeLog::new(vec![
            Ok(LOG.to_string()),
            Err(SenseError::metric_collection("nvidia-smi timed out")),
        ]);
        let mut adapter = NvidiaSmiAdapter::probe(log).unwrap();

        assert!(adapter.poll().is_err());
    }
}
