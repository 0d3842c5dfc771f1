use crate::api::config_dto::CopiesDto;

/// Step function from estimated CPU hours to the number of data copies a
/// workflow needs: one extra copy per `weight` hours above `constant`,
/// bounded by `[min_copies, max_copies]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CopiesPolicy {
    pub min_copies: u32,
    pub max_copies: u32,
    pub weight: f64,
    pub constant: f64,
}

impl From<&CopiesDto> for CopiesPolicy {
    fn from(dto: &CopiesDto) -> Self {
        CopiesPolicy { min_copies: dto.min_copies, max_copies: dto.max_copies, weight: dto.weight, constant: dto.constant }
    }
}

impl Default for CopiesPolicy {
    fn default() -> Self {
        CopiesPolicy::from(&CopiesDto::default())
    }
}

impl CopiesPolicy {
    pub fn copies_for(&self, cpu_hours: f64) -> u32 {
        if !cpu_hours.is_finite() || self.weight <= 0.0 {
            return self.min_copies;
        }
        let steps = ((cpu_hours - self.constant) / self.weight).ceil();
        if steps <= self.min_copies as f64 {
            self.min_copies
        } else if steps >= self.max_copies as f64 {
            self.max_copies
        } else {
            steps as u32
        }
    }
}
