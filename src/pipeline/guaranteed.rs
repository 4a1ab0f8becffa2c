// src/pipeline/guaranteed.rs — Terminal dependency-free fallback content

use super::types::{DeviceCategory, DiagnosisResult};

/// Canned diagnosis for a category. Always satisfies the result invariants,
/// so the pipeline can end here no matter what failed before it.
pub fn for_category(category: DeviceCategory) -> DiagnosisResult {
    match category {
        DeviceCategory::Pcb => DiagnosisResult {
            problem: "Suspected board-level fault".into(),
            explanation: "Without a confirmed diagnosis, the most common causes for circuit \
                          board problems are cold solder joints, corrosion from moisture, \
                          blown fuses, or failed electrolytic capacitors. A visual and \
                          electrical inspection will narrow it down."
                .into(),
            repair_steps: vec![
                "Disconnect all power sources and discharge large capacitors".into(),
                "Inspect the board under magnification for burnt components, bulging \
                 capacitors, and corrosion"
                    .into(),
                "Check board fuses and test power rails for continuity with a multimeter".into(),
                "Reflow any cracked or dull solder joints".into(),
                "If the fault persists, consult a professional repair service".into(),
            ],
            tools_needed: vec![
                "multimeter".into(),
                "soldering iron".into(),
                "magnifier or loupe".into(),
                "isopropyl alcohol".into(),
            ],
            estimated_cost: "$5-50 in parts, varies with the fault".into(),
            difficulty: "hard".into(),
            success_rate: "moderate for visible faults".into(),
            time_required: "1-3 hours".into(),
            safety_warnings: vec![
                "Never probe a powered board connected to mains voltage".into(),
                "Capacitors can hold a dangerous charge after power-off".into(),
            ],
        },
        DeviceCategory::Appliance => DiagnosisResult {
            problem: "Undiagnosed appliance fault".into(),
            explanation: "Most appliance failures trace back to power supply issues, worn \
                          mechanical parts, blocked filters, or a failed thermal fuse. \
                          Systematic elimination starting from the power path finds the \
                          majority of faults."
                .into(),
            repair_steps: vec![
                "Unplug the appliance before any inspection".into(),
                "Verify the outlet and power cord with a multimeter or a known-good device"
                    .into(),
                "Check accessible filters, vents, and moving parts for blockage or wear".into(),
                "Test the thermal fuse and door switches for continuity where present".into(),
                "If the fault persists, consult a professional repair service".into(),
            ],
            tools_needed: vec![
                "multimeter".into(),
                "screwdriver set".into(),
                "work gloves".into(),
            ],
            estimated_cost: "$10-80 in parts, varies with the fault".into(),
            difficulty: "medium".into(),
            success_rate: "moderate".into(),
            time_required: "1-2 hours".into(),
            safety_warnings: vec![
                "Always unplug the appliance before opening it".into(),
                "Mains-powered appliances can be lethal; stop if you are unsure".into(),
            ],
        },
        DeviceCategory::Device => DiagnosisResult {
            problem: "Undiagnosed device fault".into(),
            explanation: "When a device fails without an obvious cause, the usual suspects \
                          are a drained or dead battery, a faulty charger or cable, loose \
                          internal connectors, or a crashed controller that needs a forced \
                          restart."
                .into(),
            repair_steps: vec![
                "Force-restart the device (hold the power button for 20-30 seconds)".into(),
                "Try a different charger and cable, and charge for at least 30 minutes".into(),
                "Inspect the charging port for lint or corrosion and clean it gently".into(),
                "Measure the charger output with a multimeter if available".into(),
                "If the fault persists, consult a professional repair service".into(),
            ],
            tools_needed: vec![
                "multimeter".into(),
                "precision screwdriver set".into(),
                "plastic pry tool".into(),
            ],
            estimated_cost: "$0-60, varies with the fault".into(),
            difficulty: "easy to medium".into(),
            success_rate: "good for power-related faults".into(),
            time_required: "30-90 minutes".into(),
            safety_warnings: vec![
                "Do not puncture or bend lithium batteries".into(),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::validator::validate_response;

    #[test]
    fn test_every_category_satisfies_result_invariants() {
        for category in [
            DeviceCategory::Device,
            DeviceCategory::Pcb,
            DeviceCategory::Appliance,
        ] {
            let r = for_category(category);
            assert!(!r.problem.trim().is_empty(), "{category}: problem");
            assert!(!r.explanation.trim().is_empty(), "{category}: explanation");
            assert!(!r.repair_steps.is_empty(), "{category}: repairSteps");
            assert!(!r.tools_needed.is_empty(), "{category}: toolsNeeded");

            // The canned content must survive its own validator round trip
            let json = serde_json::to_string(&r).unwrap();
            validate_response(&json).unwrap();
        }
    }

    #[test]
    fn test_categories_get_distinct_content() {
        let device = for_category(DeviceCategory::Device);
        let pcb = for_category(DeviceCategory::Pcb);
        assert_ne!(device.problem, pcb.problem);
        assert_ne!(device.repair_steps, pcb.repair_steps);
        assert_ne!(device.tools_needed, pcb.tools_needed);
    }

    #[test]
    fn test_device_fallback_includes_generic_tool() {
        let r = for_category(DeviceCategory::Device);
        assert!(r.tools_needed.iter().any(|t| t == "multimeter"));
    }
}
