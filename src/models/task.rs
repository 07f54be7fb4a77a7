use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Wall-clock hours `[start_hour, end_hour)` of a time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl SlotWindow {
    pub fn contains_hour(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    /// Scheduling order of the slots within a day.
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Morning, TimeSlot::Afternoon, TimeSlot::Evening];

    pub fn window(self) -> SlotWindow {
        match self {
            TimeSlot::Morning => SlotWindow {
                start_hour: 6,
                end_hour: 12,
            },
            TimeSlot::Afternoon => SlotWindow {
                start_hour: 12,
                end_hour: 18,
            },
            TimeSlot::Evening => SlotWindow {
                start_hour: 18,
                end_hour: 22,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
        }
    }

    /// Slot label for an arbitrary hour. Hours outside every window
    /// (late night, early morning) read as evening.
    pub fn classify_hour(hour: u32) -> Self {
        if TimeSlot::Morning.window().contains_hour(hour) {
            TimeSlot::Morning
        } else if TimeSlot::Afternoon.window().contains_hour(hour) {
            TimeSlot::Afternoon
        } else {
            TimeSlot::Evening
        }
    }
}

/// A user-authored task submitted for one scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Minutes.
    pub estimated_duration: u32,
    #[serde(default)]
    pub priority: TaskPriority,
    pub preferred_time_slot: TimeSlot,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        estimated_duration: u32,
        preferred_time_slot: TimeSlot,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            estimated_duration,
            priority: TaskPriority::Medium,
            preferred_time_slot,
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}
