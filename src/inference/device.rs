use anyhow::{anyhow, Result};
use candle::Device;
use tracing::warn;

/// Resolve an `EMBED_DEVICE` value: `cpu`, `cuda`, `cuda:N` or `gpu:N`.
pub fn parse_device_preference(value: &str) -> Result<Device> {
    let trimmed = value.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.is_empty() || lower == "cpu" {
        Ok(Device::Cpu)
    } else if lower.starts_with("cuda") || lower.starts_with("gpu") {
        let ordinal = cuda_ordinal(trimmed);
        Device::new_cuda(ordinal).map_err(|err| {
            anyhow!(
                "requested CUDA device {} but initialization failed ({err}). Build with the \
                 `cuda` feature and ensure CUDA libraries are available.",
                ordinal
            )
        })
    } else {
        warn!("unrecognized EMBED_DEVICE value '{}', using cpu", trimmed);
        Ok(Device::Cpu)
    }
}

fn cuda_ordinal(value: &str) -> usize {
    value
        .split(':')
        .nth(1)
        .and_then(|part| part.trim().parse::<usize>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_and_unknown_values_resolve_to_cpu() {
        assert!(parse_device_preference("cpu").unwrap().is_cpu());
        assert!(parse_device_preference(" CPU ").unwrap().is_cpu());
        assert!(parse_device_preference("").unwrap().is_cpu());
        assert!(parse_device_preference("tpu").unwrap().is_cpu());
    }

    #[test]
    fn reads_cuda_ordinal() {
        assert_eq!(cuda_ordinal("cuda:2"), 2);
        assert_eq!(cuda_ordinal("gpu:1"), 1);
        assert_eq!(cuda_ordinal("cuda"), 0);
        assert_eq!(cuda_ordinal("cuda:x"), 0);
    }
}
