//! Default table catalog
//!
//! The declared tables of the multi-tenant business datastore, grouped by
//! domain area. Every table is flat: scalar columns plus foreign-key ids.
//! Parent-scoped tables name the one-hop parent that carries their tenant
//! id. Declaration order is only a tie-break; the actual restore order is
//! computed from the reference graph.

use super::{SchemaCatalog, TableDef};
use crate::constants::snapshot::SCHEMA_VERSION;

pub fn default_catalog() -> SchemaCatalog {
    let mut tables = Vec::with_capacity(80);

    // Shared reference data (not tenant-owned)
    tables.push(TableDef::new("currencies", &["code"]));

    // Tenancy and access
    tables.push(TableDef::new("businesses", &["id"]).scoped_by("id"));
    tables.push(
        TableDef::new("businessSettings", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("businessLocations", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("businessHours", &["businessId", "weekday"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("locationId", "businessLocations"),
    );
    tables.push(
        TableDef::new("subscriptions", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("subscriptionInvoices", &["id"])
            .scoped_via("subscriptionId", "subscriptions")
            .references("subscriptionId", "subscriptions"),
    );
    tables.push(
        TableDef::new("users", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("userRoles", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("userRoleAssignments", &["userId", "roleId"])
            .scoped_via("userId", "users")
            .references("userId", "users")
            .references("roleId", "userRoles"),
    );
    tables.push(
        TableDef::new("apiTokens", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("userId", "users"),
    );
    tables.push(
        TableDef::new("notificationPreferences", &["userId", "channel"])
            .scoped_via("userId", "users")
            .references("userId", "users"),
    );

    // Staff and scheduling
    tables.push(
        TableDef::new("teams", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("employees", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("userId", "users")
            .references("teamId", "teams")
            .references("locationId", "businessLocations"),
    );
    tables.push(
        TableDef::new("employeeProfiles", &["employeeId"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("employeeContracts", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("employeeDocuments", &["id"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("absenceTypes", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("employeeAbsences", &["id"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees")
            .references("absenceTypeId", "absenceTypes"),
    );
    tables.push(
        TableDef::new("employeeAvailability", &["employeeId", "weekday"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("teamMembers", &["teamId", "employeeId"])
            .scoped_via("teamId", "teams")
            .references("teamId", "teams")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("workPatterns", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("shiftTemplates", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("locationId", "businessLocations"),
    );
    tables.push(
        TableDef::new("shifts", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("templateId", "shiftTemplates")
            .references("locationId", "businessLocations"),
    );
    tables.push(
        TableDef::new("shiftAssignments", &["shiftId", "employeeId"])
            .scoped_via("shiftId", "shifts")
            .references("shiftId", "shifts")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("timeClockEntries", &["id"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees")
            .references("shiftId", "shifts"),
    );
    tables.push(
        TableDef::new("timesheets", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("timesheetEntries", &["id"])
            .scoped_via("timesheetId", "timesheets")
            .references("timesheetId", "timesheets")
            .references("shiftId", "shifts"),
    );
    tables.push(
        TableDef::new("holidays", &["businessId", "date"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("announcements", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("authorId", "users"),
    );

    // Payroll
    tables.push(
        TableDef::new("payGrades", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("taxProfiles", &["id"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("bankAccounts", &["id"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("payrollRuns", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("payrollEntries", &["id"])
            .scoped_via("payrollRunId", "payrollRuns")
            .references("payrollRunId", "payrollRuns")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("payrollAdjustments", &["id"])
            .scoped_via("payrollEntryId", "payrollEntries")
            .references("payrollEntryId", "payrollEntries"),
    );
    tables.push(
        TableDef::new("reimbursements", &["id"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees")
            .references("payrollRunId", "payrollRuns"),
    );
    tables.push(
        TableDef::new("bonuses", &["id"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees")
            .references("payrollRunId", "payrollRuns"),
    );
    tables.push(
        TableDef::new("deductions", &["id"])
            .scoped_via("employeeId", "employees")
            .references("employeeId", "employees")
            .references("payrollRunId", "payrollRuns"),
    );

    // Product catalog
    tables.push(
        TableDef::new("productCategories", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("parentId", "productCategories"),
    );
    tables.push(
        TableDef::new("taxRates", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("businessProducts", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("categoryId", "productCategories")
            .references("taxRateId", "taxRates"),
    );
    tables.push(
        TableDef::new("productVariants", &["id"])
            .scoped_via("productId", "businessProducts")
            .references("productId", "businessProducts"),
    );
    tables.push(
        TableDef::new("priceLists", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("priceListEntries", &["priceListId", "variantId"])
            .scoped_via("priceListId", "priceLists")
            .references("priceListId", "priceLists")
            .references("variantId", "productVariants"),
    );
    tables.push(
        TableDef::new("discounts", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("modifierGroups", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("productModifiers", &["id"])
            .scoped_via("groupId", "modifierGroups")
            .references("groupId", "modifierGroups")
            .references("productId", "businessProducts"),
    );

    // Inventory
    tables.push(
        TableDef::new("suppliers", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("supplierContacts", &["id"])
            .scoped_via("supplierId", "suppliers")
            .references("supplierId", "suppliers"),
    );
    tables.push(
        TableDef::new("stockLocations", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("locationId", "businessLocations"),
    );
    tables.push(
        TableDef::new("stockLevels", &["stockLocationId", "variantId"])
            .scoped_via("stockLocationId", "stockLocations")
            .references("stockLocationId", "stockLocations")
            .references("variantId", "productVariants"),
    );
    tables.push(
        TableDef::new("purchaseOrders", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("supplierId", "suppliers")
            .references("stockLocationId", "stockLocations"),
    );
    tables.push(
        TableDef::new("purchaseOrderLines", &["id"])
            .scoped_via("purchaseOrderId", "purchaseOrders")
            .references("purchaseOrderId", "purchaseOrders")
            .references("variantId", "productVariants"),
    );
    tables.push(
        TableDef::new("stockMovements", &["id"])
            .scoped_via("stockLocationId", "stockLocations")
            .references("stockLocationId", "stockLocations")
            .references("variantId", "productVariants"),
    );
    tables.push(
        TableDef::new("stockAdjustments", &["id"])
            .scoped_via("stockLocationId", "stockLocations")
            .references("stockLocationId", "stockLocations")
            .references("variantId", "productVariants")
            .references("approvedBy", "users"),
    );
    tables.push(
        TableDef::new("stockTakes", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("stockLocationId", "stockLocations"),
    );
    tables.push(
        TableDef::new("stockTakeLines", &["stockTakeId", "variantId"])
            .scoped_via("stockTakeId", "stockTakes")
            .references("stockTakeId", "stockTakes")
            .references("variantId", "productVariants"),
    );

    // Customers and sales
    tables.push(
        TableDef::new("customerGroups", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("customers", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("groupId", "customerGroups"),
    );
    tables.push(
        TableDef::new("customerAddresses", &["id"])
            .scoped_via("customerId", "customers")
            .references("customerId", "customers"),
    );
    tables.push(
        TableDef::new("salesOrders", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("customerId", "customers")
            .references("locationId", "businessLocations"),
    );
    tables.push(
        TableDef::new("salesOrderLines", &["id"])
            .scoped_via("orderId", "salesOrders")
            .references("orderId", "salesOrders")
            .references("variantId", "productVariants")
            .references("discountId", "discounts"),
    );
    tables.push(
        TableDef::new("invoices", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("customerId", "customers")
            .references("orderId", "salesOrders"),
    );
    tables.push(
        TableDef::new("invoiceLines", &["id"])
            .scoped_via("invoiceId", "invoices")
            .references("invoiceId", "invoices")
            .references("taxRateId", "taxRates"),
    );
    tables.push(
        TableDef::new("creditNotes", &["id"])
            .scoped_via("invoiceId", "invoices")
            .references("invoiceId", "invoices"),
    );
    tables.push(
        TableDef::new("payments", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("invoiceId", "invoices")
            .references("currencyCode", "currencies"),
    );
    tables.push(
        TableDef::new("refunds", &["id"])
            .scoped_via("paymentId", "payments")
            .references("paymentId", "payments"),
    );
    tables.push(
        TableDef::new("registers", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("locationId", "businessLocations"),
    );
    tables.push(
        TableDef::new("registerSessions", &["id"])
            .scoped_via("registerId", "registers")
            .references("registerId", "registers")
            .references("openedBy", "users"),
    );
    tables.push(
        TableDef::new("cashMovements", &["id"])
            .scoped_via("sessionId", "registerSessions")
            .references("sessionId", "registerSessions"),
    );

    // Operations
    tables.push(
        TableDef::new("tasks", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("createdBy", "users"),
    );
    tables.push(
        TableDef::new("taskAssignments", &["taskId", "employeeId"])
            .scoped_via("taskId", "tasks")
            .references("taskId", "tasks")
            .references("employeeId", "employees"),
    );
    tables.push(
        TableDef::new("documents", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("uploadedBy", "users"),
    );
    tables.push(
        TableDef::new("documentShares", &["documentId", "userId"])
            .scoped_via("documentId", "documents")
            .references("documentId", "documents")
            .references("userId", "users"),
    );

    // Integrations and audit
    tables.push(
        TableDef::new("integrationConnections", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("syncCursors", &["connectionId", "resource"])
            .scoped_via("connectionId", "integrationConnections")
            .references("connectionId", "integrationConnections"),
    );
    tables.push(
        TableDef::new("webhookSubscriptions", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses"),
    );
    tables.push(
        TableDef::new("importJobs", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("requestedBy", "users"),
    );
    tables.push(
        TableDef::new("exportJobs", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .references("requestedBy", "users"),
    );
    tables.push(
        TableDef::new("auditLogs", &["id"])
            .scoped_by("businessId")
            .references("businessId", "businesses")
            .audit(),
    );
    tables.push(
        TableDef::new("webhookDeliveries", &["id"])
            .scoped_via("subscriptionId", "webhookSubscriptions")
            .references("subscriptionId", "webhookSubscriptions")
            .audit(),
    );

    SchemaCatalog::new(tables, SCHEMA_VERSION)
}
