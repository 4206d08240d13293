//! Calculator state between input edits.
//!
//! Every accepted input change opens a new generation. A computation finishing
//! under an older generation is dropped, so only the most recent request's
//! result is ever retained.

use crate::core::{
    CalcError, SIP_FIELDS, SWP_FIELDS, SipInputs, SipResult, SwpInputs, SwpResult,
    ValidationErrors, calculate_sip, simulate_withdrawal, suggest_from_sip, validate_sip,
    validate_swp,
};
use crate::store::SavedCalculation;

pub type Generation = u64;

pub const DEFAULT_SIP_INPUTS: SipInputs = SipInputs {
    investment_amount: 5_000.0,
    sip_duration: 15.0,
    annual_return: 12.0,
};

pub const DEFAULT_SWP_INPUTS: SwpInputs = SwpInputs {
    total_investment: 1_000_000.0,
    monthly_withdrawal: 8_000.0,
    annual_return: 12.0,
};

/// Last-write-wins slot keyed by generation.
#[derive(Debug, Clone)]
pub struct Latest<T> {
    issued: Generation,
    value: Option<T>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            issued: 0,
            value: None,
        }
    }
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Generation {
        self.issued += 1;
        self.issued
    }

    /// Keeps `value` only when `generation` is the newest one issued.
    pub fn offer(&mut self, generation: Generation, value: T) -> bool {
        if generation != self.issued {
            return false;
        }
        self.value = Some(value);
        true
    }

    pub fn current(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.issued
    }
}

#[derive(Debug, Clone)]
pub struct CalculatorSession {
    sip_inputs: SipInputs,
    swp_inputs: SwpInputs,
    errors: ValidationErrors,
    sip: Latest<SipResult>,
    swp: Latest<SwpResult>,
}

impl Default for CalculatorSession {
    fn default() -> Self {
        Self {
            sip_inputs: DEFAULT_SIP_INPUTS,
            swp_inputs: DEFAULT_SWP_INPUTS,
            errors: ValidationErrors::new(),
            sip: Latest::new(),
            swp: Latest::new(),
        }
    }
}

impl CalculatorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sip_inputs(&self) -> SipInputs {
        self.sip_inputs
    }

    pub fn swp_inputs(&self) -> SwpInputs {
        self.swp_inputs
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn sip_result(&self) -> Option<&SipResult> {
        self.sip.current()
    }

    pub fn swp_result(&self) -> Option<&SwpResult> {
        self.swp.current()
    }

    /// Records the inputs and their field errors. Returns the generation to
    /// compute under, or `None` when the inputs are invalid; the previous
    /// result stays in place in that case.
    pub fn set_sip_inputs(&mut self, inputs: SipInputs) -> Option<Generation> {
        self.sip_inputs = inputs;
        self.errors.replace_fields(&SIP_FIELDS, validate_sip(&inputs));
        if self.errors.any(&SIP_FIELDS) {
            return None;
        }
        Some(self.sip.begin())
    }

    pub fn complete_sip(
        &mut self,
        generation: Generation,
        result: Result<SipResult, CalcError>,
    ) -> bool {
        match result {
            Ok(result) => {
                let kept = self.sip.offer(generation, result);
                if !kept {
                    tracing::debug!(
                        generation,
                        latest = self.sip.generation(),
                        "discarding stale SIP result"
                    );
                }
                kept
            }
            Err(err) => {
                tracing::debug!(generation, error = %err, "SIP calculation failed");
                false
            }
        }
    }

    /// Validate, calculate and retain in one step.
    pub fn update_sip(&mut self, inputs: SipInputs) -> Option<&SipResult> {
        let generation = self.set_sip_inputs(inputs)?;
        let result = calculate_sip(&self.sip_inputs);
        self.complete_sip(generation, result);
        self.sip_result()
    }

    pub fn set_swp_inputs(&mut self, inputs: SwpInputs) -> Option<Generation> {
        self.swp_inputs = inputs;
        self.errors.replace_fields(&SWP_FIELDS, validate_swp(&inputs));
        if self.errors.any(&SWP_FIELDS) {
            return None;
        }
        Some(self.swp.begin())
    }

    pub fn complete_swp(&mut self, generation: Generation, result: Option<SwpResult>) -> bool {
        let Some(result) = result else {
            tracing::debug!(generation, "SWP simulation rejected its inputs");
            return false;
        };
        let kept = self.swp.offer(generation, result);
        if !kept {
            tracing::debug!(
                generation,
                latest = self.swp.generation(),
                "discarding stale SWP result"
            );
        }
        kept
    }

    pub fn update_swp(&mut self, inputs: SwpInputs) -> Option<&SwpResult> {
        let generation = self.set_swp_inputs(inputs)?;
        let result = simulate_withdrawal(&self.swp_inputs);
        self.complete_swp(generation, result);
        self.swp_result()
    }

    /// Carries the current SIP maturity value into the withdrawal inputs.
    pub fn seed_swp_from_sip(&mut self) -> Option<&SwpResult> {
        let inputs = suggest_from_sip(self.sip.current()?);
        self.update_swp(inputs)
    }

    /// Restores a saved calculation. Any computation still in flight for the
    /// old inputs is invalidated.
    pub fn load_saved(&mut self, saved: &SavedCalculation) {
        self.sip_inputs = saved.inputs();
        self.errors
            .replace_fields(&SIP_FIELDS, validate_sip(&self.sip_inputs));
        let generation = self.sip.begin();
        self.sip.offer(generation, saved.result.clone());
        tracing::debug!(id = saved.id, name = %saved.name, "loaded saved calculation");
    }
}
