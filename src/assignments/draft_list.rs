//! Pending assignments for one order, kept in insertion order.

use rust_decimal::Decimal;

use super::model::{Assignment, Role};
use crate::error::AssignmentError;

/// The not-yet-submitted roster for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentDraftList {
    order_id: i64,
    items: Vec<Assignment>,
}

impl AssignmentDraftList {
    pub fn new(order_id: i64) -> Self {
        Self {
            order_id,
            items: Vec::new(),
        }
    }

    pub fn order_id(&self) -> i64 {
        self.order_id
    }

    /// Append an assignment. Each operator may appear once per order.
    pub fn add(&mut self, assignment: Assignment) -> Result<(), AssignmentError> {
        if assignment.order_id != self.order_id {
            return Err(AssignmentError::OrderMismatch {
                expected: self.order_id,
                got: assignment.order_id,
            });
        }
        if assignment.additional_costs < Decimal::ZERO {
            return Err(AssignmentError::NegativeCost(assignment.additional_costs));
        }
        if self.contains(assignment.operator_id) {
            return Err(AssignmentError::DuplicateOperator {
                operator_id: assignment.operator_id,
            });
        }
        self.items.push(assignment);
        Ok(())
    }

    /// Remove an operator's assignment, returning it.
    pub fn remove(&mut self, operator_id: i64) -> Option<Assignment> {
        let pos = self.items.iter().position(|a| a.operator_id == operator_id)?;
        Some(self.items.remove(pos))
    }

    pub fn set_role(&mut self, operator_id: i64, role: Role) -> Result<(), AssignmentError> {
        self.get_mut(operator_id)?.role = role;
        Ok(())
    }

    pub fn set_truck(
        &mut self,
        operator_id: i64,
        truck_id: Option<i64>,
    ) -> Result<(), AssignmentError> {
        self.get_mut(operator_id)?.truck_id = truck_id;
        Ok(())
    }

    pub fn set_additional_costs(
        &mut self,
        operator_id: i64,
        costs: Decimal,
    ) -> Result<(), AssignmentError> {
        if costs < Decimal::ZERO {
            return Err(AssignmentError::NegativeCost(costs));
        }
        self.get_mut(operator_id)?.additional_costs = costs;
        Ok(())
    }

    pub fn get(&self, operator_id: i64) -> Option<&Assignment> {
        self.items.iter().find(|a| a.operator_id == operator_id)
    }

    fn get_mut(&mut self, operator_id: i64) -> Result<&mut Assignment, AssignmentError> {
        self.items
            .iter_mut()
            .find(|a| a.operator_id == operator_id)
            .ok_or(AssignmentError::UnknownOperator { operator_id })
    }

    pub fn contains(&self, operator_id: i64) -> bool {
        self.get(operator_id).is_some()
    }

    pub fn operator_ids(&self) -> Vec<i64> {
        self.items.iter().map(|a| a.operator_id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Assignment] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the contents with a reconciled list.
    pub(crate) fn replace(&mut self, items: Vec<Assignment>) {
        self.items = items;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn list() -> AssignmentDraftList {
        let mut l = AssignmentDraftList::new(10);
        l.add(Assignment::new(5, 10, Role::Driver).with_truck(1)).unwrap();
        l.add(Assignment::new(7, 10, Role::Operator)).unwrap();
        l.add(Assignment::new(9, 10, Role::TeamLeader)).unwrap();
        l
    }

    #[test]
    fn keeps_insertion_order() {
        assert_eq!(list().operator_ids(), vec![5, 7, 9]);
    }

    #[test]
    fn rejects_duplicate_operator() {
        let mut l = list();
        let err = l.add(Assignment::new(7, 10, Role::Driver)).unwrap_err();
        assert!(matches!(err, AssignmentError::DuplicateOperator { operator_id: 7 }));
        assert_eq!(l.len(), 3);
    }

    #[test]
    fn rejects_foreign_order_and_negative_cost() {
        let mut l = list();
        assert!(matches!(
            l.add(Assignment::new(11, 99, Role::Operator)),
            Err(AssignmentError::OrderMismatch { expected: 10, got: 99 })
        ));
        assert!(matches!(
            l.add(Assignment::new(11, 10, Role::Operator).with_additional_costs(dec!(-1))),
            Err(AssignmentError::NegativeCost(_))
        ));
        assert!(l.set_additional_costs(5, dec!(-0.01)).is_err());
    }

    #[test]
    fn edits_by_operator() {
        let mut l = list();
        l.set_role(7, Role::Driver).unwrap();
        l.set_truck(7, Some(4)).unwrap();
        l.set_additional_costs(7, dec!(25.00)).unwrap();
        let a = l.get(7).unwrap();
        assert_eq!(a.role, Role::Driver);
        assert_eq!(a.truck_id, Some(4));
        assert_eq!(a.additional_costs, dec!(25));

        assert!(matches!(
            l.set_role(42, Role::Operator),
            Err(AssignmentError::UnknownOperator { operator_id: 42 })
        ));
    }

    #[test]
    fn remove_returns_entry() {
        let mut l = list();
        assert_eq!(l.remove(7).map(|a| a.operator_id), Some(7));
        assert_eq!(l.remove(7), None);
        assert_eq!(l.operator_ids(), vec![5, 9]);
    }
}
