//! Repair order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, SalesPersonId, StoreId, TechnicianId};
use order_store::{CostRecord, DownPaymentRecord, PasscodeRecord, RepairOrderRecord};

use super::{
    Damage, Defect, Money, OrderCost, OrderError, OrderPayment, OrderPhoto, OrderStatus,
    PhoneCondition, PhoneEquipment, PhoneNumber, PhoneSecurity, Slug, require_non_empty,
};

/// Optional attributes of a new order.
///
/// Each of them can be assigned at most once; passing them here validates
/// them together with the rest of the order.
#[derive(Debug, Clone, Default)]
pub struct OrderOptions {
    pub imei: Option<String>,
    pub parts_not_checked_yet: Option<String>,
    pub security: Option<PhoneSecurity>,
    pub down_payment: Option<OrderPayment>,
}

/// Everything needed to create an order. Damages, conditions and
/// equipments are names already resolved from their store-scoped IDs.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub created_at: DateTime<Utc>,
    pub slug: Slug,
    pub store_id: StoreId,
    pub customer_name: String,
    pub contact_number: PhoneNumber,
    pub phone_type: String,
    pub color: String,
    pub sales_person_id: SalesPersonId,
    pub technician_id: TechnicianId,
    pub initial_cost: Money,
    pub damages: Vec<String>,
    pub phone_conditions: Vec<String>,
    pub phone_equipments: Vec<String>,
    pub photos: Vec<String>,
    pub options: OrderOptions,
}

/// Timestamps and notes recorded after creation.
///
/// Nothing writes these yet: confirm, complete, pick-up and cancel
/// transitions are not implemented, so a new order stays `Received`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Lifecycle {
    confirmed_at: Option<DateTime<Utc>>,
    confirmation_content: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    picked_up_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    repayment: Option<OrderPayment>,
}

/// Repair order aggregate root.
///
/// An `Order` only exists in a valid state: [`Order::new`] checks every
/// invariant before building anything and fails without a partial object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    created_at: DateTime<Utc>,
    slug: Slug,
    store_id: StoreId,
    customer_name: String,
    contact_number: PhoneNumber,
    phone_type: String,
    color: String,
    sales_person_id: SalesPersonId,
    technician_id: TechnicianId,
    costs: Vec<OrderCost>,
    damages: Vec<Damage>,
    phone_conditions: Vec<PhoneCondition>,
    phone_equipments: Vec<PhoneEquipment>,
    photos: Vec<OrderPhoto>,
    imei: Option<String>,
    parts_not_checked_yet: Option<String>,
    security: Option<PhoneSecurity>,
    down_payment: Option<OrderPayment>,
    lifecycle: Lifecycle,
}

impl Order {
    /// Creates a new order with a single initial cost.
    pub fn new(new: NewOrder) -> Result<Self, OrderError> {
        Self::validate(&new)?;

        let initial_cost = OrderCost::initial(new.initial_cost, new.created_at)?;
        let mut order = Self {
            id: OrderId::new(),
            created_at: new.created_at,
            slug: new.slug,
            store_id: new.store_id,
            customer_name: new.customer_name,
            contact_number: new.contact_number,
            phone_type: new.phone_type,
            color: new.color,
            sales_person_id: new.sales_person_id,
            technician_id: new.technician_id,
            costs: vec![initial_cost],
            damages: collect(new.damages, Damage::new)?,
            phone_conditions: collect(new.phone_conditions, PhoneCondition::new)?,
            phone_equipments: collect(new.phone_equipments, PhoneEquipment::new)?,
            photos: collect(new.photos, OrderPhoto::new)?,
            imei: None,
            parts_not_checked_yet: None,
            security: None,
            down_payment: None,
            lifecycle: Lifecycle::default(),
        };

        let OrderOptions {
            imei,
            parts_not_checked_yet,
            security,
            down_payment,
        } = new.options;
        if let Some(imei) = imei {
            order.set_imei(imei)?;
        }
        if let Some(parts) = parts_not_checked_yet {
            order.set_parts_not_checked_yet(parts)?;
        }
        if let Some(security) = security {
            order.set_security(security)?;
        }
        if let Some(payment) = down_payment {
            order.set_down_payment(payment)?;
        }

        Ok(order)
    }

    /// Checks every creation invariant, stopping at the first violation.
    fn validate(new: &NewOrder) -> Result<(), OrderError> {
        require_non_empty("customer_name", &new.customer_name)?;
        require_non_empty("phone_type", &new.phone_type)?;
        require_non_empty("color", &new.color)?;

        if new.damages.is_empty() {
            return Err(OrderError::invalid("damages", Defect::Empty));
        }
        if new.photos.is_empty() {
            return Err(OrderError::invalid("photos", Defect::Empty));
        }
        for damage in &new.damages {
            require_non_empty("damage", damage)?;
        }
        for condition in &new.phone_conditions {
            require_non_empty("phone_condition", condition)?;
        }
        for equipment in &new.phone_equipments {
            require_non_empty("phone_equipment", equipment)?;
        }
        for photo in &new.photos {
            require_non_empty("photo", photo)?;
        }

        if new.initial_cost.is_zero() {
            return Err(OrderError::invalid("initial_cost", Defect::Zero));
        }

        let options = &new.options;
        if let Some(imei) = &options.imei {
            require_non_empty("imei", imei)?;
        }
        if let Some(parts) = &options.parts_not_checked_yet {
            require_non_empty("parts_not_checked_yet", parts)?;
        }
        if let Some(security) = &options.security {
            PhoneSecurity::new(security.value(), security.is_pattern_locked())?;
        }
        if let Some(payment) = &options.down_payment {
            check_down_payment(payment, new.initial_cost)?;
        }

        Ok(())
    }
}

fn collect<T>(
    values: Vec<String>,
    build: impl Fn(String) -> Result<T, OrderError>,
) -> Result<Vec<T>, OrderError> {
    values.into_iter().map(build).collect()
}

fn check_down_payment(payment: &OrderPayment, initial_cost: Money) -> Result<(), OrderError> {
    if !payment.amount().is_positive() {
        return Err(OrderError::invalid("down_payment", Defect::NotPositive));
    }
    if payment.amount() > initial_cost {
        return Err(OrderError::invalid(
            "down_payment",
            Defect::ExceedsInitialCost,
        ));
    }
    Ok(())
}

// Set-once attributes
impl Order {
    pub fn set_imei(&mut self, imei: impl Into<String>) -> Result<(), OrderError> {
        if self.imei.is_some() {
            return Err(OrderError::AlreadySet { field: "imei" });
        }
        let imei = imei.into();
        require_non_empty("imei", &imei)?;
        self.imei = Some(imei);
        Ok(())
    }

    pub fn set_parts_not_checked_yet(&mut self, parts: impl Into<String>) -> Result<(), OrderError> {
        if self.parts_not_checked_yet.is_some() {
            return Err(OrderError::AlreadySet {
                field: "parts_not_checked_yet",
            });
        }
        let parts = parts.into();
        require_non_empty("parts_not_checked_yet", &parts)?;
        self.parts_not_checked_yet = Some(parts);
        Ok(())
    }

    pub fn set_security(&mut self, security: PhoneSecurity) -> Result<(), OrderError> {
        if self.security.is_some() {
            return Err(OrderError::AlreadySet {
                field: "phone_security",
            });
        }
        let security = PhoneSecurity::new(security.value(), security.is_pattern_locked())?;
        self.security = Some(security);
        Ok(())
    }

    /// The down payment may not exceed the initial cost.
    pub fn set_down_payment(&mut self, payment: OrderPayment) -> Result<(), OrderError> {
        if self.down_payment.is_some() {
            return Err(OrderError::AlreadySet {
                field: "down_payment",
            });
        }
        check_down_payment(&payment, self.initial_cost())?;
        self.down_payment = Some(payment);
        Ok(())
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn contact_number(&self) -> &PhoneNumber {
        &self.contact_number
    }

    pub fn phone_type(&self) -> &str {
        &self.phone_type
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn sales_person_id(&self) -> SalesPersonId {
        self.sales_person_id
    }

    pub fn technician_id(&self) -> TechnicianId {
        self.technician_id
    }

    pub fn costs(&self) -> &[OrderCost] {
        &self.costs
    }

    /// Amount of the cost recorded at creation.
    pub fn initial_cost(&self) -> Money {
        self.costs
            .iter()
            .find(|cost| cost.is_initial())
            .map(OrderCost::amount)
            .unwrap_or_default()
    }

    pub fn damages(&self) -> &[Damage] {
        &self.damages
    }

    pub fn phone_conditions(&self) -> &[PhoneCondition] {
        &self.phone_conditions
    }

    pub fn phone_equipments(&self) -> &[PhoneEquipment] {
        &self.phone_equipments
    }

    pub fn photos(&self) -> &[OrderPhoto] {
        &self.photos
    }

    pub fn imei(&self) -> Option<&str> {
        self.imei.as_deref()
    }

    pub fn parts_not_checked_yet(&self) -> Option<&str> {
        self.parts_not_checked_yet.as_deref()
    }

    pub fn security(&self) -> Option<&PhoneSecurity> {
        self.security.as_ref()
    }

    pub fn down_payment(&self) -> Option<&OrderPayment> {
        self.down_payment.as_ref()
    }

    pub fn repayment(&self) -> Option<&OrderPayment> {
        self.lifecycle.repayment.as_ref()
    }

    pub fn confirmation_content(&self) -> Option<&str> {
        self.lifecycle.confirmation_content.as_deref()
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.lifecycle.cancellation_reason.as_deref()
    }

    /// Current lifecycle status, derived from the lifecycle timestamps.
    /// Always `Received` until the later transitions exist.
    pub fn status(&self) -> OrderStatus {
        let l = &self.lifecycle;
        if l.cancelled_at.is_some() {
            OrderStatus::Cancelled
        } else if l.picked_up_at.is_some() {
            OrderStatus::PickedUp
        } else if l.completed_at.is_some() {
            OrderStatus::Completed
        } else if l.confirmed_at.is_some() {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Received
        }
    }
}

impl From<&Order> for RepairOrderRecord {
    fn from(order: &Order) -> Self {
        RepairOrderRecord {
            id: order.id,
            store_id: order.store_id,
            slug: order.slug.to_string(),
            created_at: order.created_at,
            customer_name: order.customer_name.clone(),
            contact_phone_number: order.contact_number.to_string(),
            phone_type: order.phone_type.clone(),
            color: order.color.clone(),
            sales_person_id: order.sales_person_id,
            technician_id: order.technician_id,
            imei: order.imei.clone(),
            parts_not_checked_yet: order.parts_not_checked_yet.clone(),
            passcode: order.security.as_ref().map(|s| PasscodeRecord {
                value: s.value().to_string(),
                is_pattern_locked: s.is_pattern_locked(),
            }),
            down_payment: order.down_payment.map(|p| DownPaymentRecord {
                amount: p.amount().amount(),
                payment_method_id: p.payment_method_id(),
            }),
            damages: order.damages.iter().map(|d| d.to_string()).collect(),
            phone_conditions: order
                .phone_conditions
                .iter()
                .map(|c| c.to_string())
                .collect(),
            phone_equipments: order
                .phone_equipments
                .iter()
                .map(|e| e.to_string())
                .collect(),
            photos: order.photos.iter().map(|p| p.to_string()).collect(),
            costs: order
                .costs
                .iter()
                .map(|c| CostRecord {
                    id: c.id(),
                    amount: c.amount().amount(),
                    reason: c.reason().map(String::from),
                    created_at: c.created_at(),
                })
                .collect(),
        }
    }
}
