/// Notification event types, carried as the `net` codes in a subscription's
/// `enc` criteria.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    UpdateOfResource,
    DeleteOfResource,
    CreateOfDirectChild,
    DeleteOfDirectChild,
    RetrieveOfContainerWithNoChildren,
    TriggerReceivedForAe,
}

impl EventType {
    pub fn code(self) -> u8 {
        match self {
            EventType::UpdateOfResource => 1,
            EventType::DeleteOfResource => 2,
            EventType::CreateOfDirectChild => 3,
            EventType::DeleteOfDirectChild => 4,
            EventType::RetrieveOfContainerWithNoChildren => 5,
            EventType::TriggerReceivedForAe => 6,
        }
    }

    pub fn matches(self, net: &[u8]) -> bool {
        net.contains(&self.code())
    }
}
