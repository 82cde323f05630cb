use crate::domain::forecast::ForecastItem;
use crate::simulation::{resolve, Scenario, ScenarioDelta};

pub struct SimulationService;

impl SimulationService {
    pub fn resolve_scenario(base: &[ForecastItem], deltas: &[ScenarioDelta]) -> Vec<ForecastItem> {
        resolve(base, deltas)
    }

    /// Human-readable outline of a scenario and its effect on the item count.
    pub fn describe(base: &[ForecastItem], scenario: &Scenario) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(format!(
            "Scenario `{}` contains {} change(s)",
            scenario.name,
            scenario.deltas.len()
        ));
        for delta in &scenario.deltas {
            lines.push(format!("- {}", delta.summary()));
        }
        let resolved = scenario.resolve(base);
        let delta = resolved.len() as isize - base.len() as isize;
        if delta != 0 {
            lines.push(format!("Items delta: {}", delta));
        }
        lines
    }
}
